//! Cuts a reference template out of the live screen: point the mouse at the
//! icon, press Enter, and a small region around the cursor is saved to the
//! configured template path for later template-mode matching.

use deskscribe::services::input::InputDriver;
use deskscribe::services::screen::ScreenCapture;
use deskscribe::ConfigManager;
use std::io::BufRead;
use std::time::Duration;

const TEMPLATE_SIZE: u32 = 64;

fn main() {
    tracing_subscriber::fmt().init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config = ConfigManager::new()?.load()?;

    println!("Template capture tool");
    println!("1. Position your mouse over the target icon");
    println!(
        "2. Press Enter to capture a {}x{} region around it",
        TEMPLATE_SIZE, TEMPLATE_SIZE
    );

    std::io::stdin()
        .lock()
        .lines()
        .next()
        .transpose()
        .map_err(|e| format!("Failed to read input: {}", e))?;

    let input = InputDriver::new()?;
    let (x, y) = input.cursor_position()?;
    println!("Mouse position: ({}, {})", x, y);
    std::thread::sleep(Duration::from_secs(1));

    let screen = ScreenCapture::new()?;
    let (width, height) = screen.dimensions()?;
    println!("Capturing from {}x{} screen...", width, height);
    let template = screen.capture_around(x, y, TEMPLATE_SIZE, TEMPLATE_SIZE)?;

    let path = &config.locator.template_path;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create template directory: {}", e))?;
    }
    template
        .save(path)
        .map_err(|e| format!("Failed to save template {:?}: {}", path, e))?;

    println!("Template saved to: {}", path.display());
    println!("You can now switch the locator mode to \"template\"");
    Ok(())
}
