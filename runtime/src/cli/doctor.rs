//! Environment readiness check.

use crate::config::{session_config, BrowserArgs};
use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use jobscout::cookies::read_cookie_file;

/// Check Chromium availability, the cookie file, and the diagnostics directory.
pub async fn run(browser: &BrowserArgs) -> Result<()> {
    println!("JobScout Doctor");
    println!("===============");
    println!();

    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    let chromium = find_chromium();
    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!("[!!] Chromium NOT found. Install Chrome or set JOBSCOUT_CHROMIUM_PATH."),
    }

    let config = session_config(browser);
    if !config.use_cookies {
        println!("[--] Cookie persistence disabled");
    } else if !config.cookie_file.exists() {
        println!(
            "[??] Cookie file {} does not exist yet (a fresh session will be used)",
            config.cookie_file.display()
        );
    } else {
        match read_cookie_file(&config.cookie_file) {
            Ok(cookies) => println!(
                "[OK] Cookie file {}: {} cookie(s)",
                config.cookie_file.display(),
                cookies.len()
            ),
            Err(e) => println!(
                "[!!] Cookie file {} is unreadable ({e}); it will be ignored",
                config.cookie_file.display()
            ),
        }
    }

    let dir = &config.diagnostics_dir;
    if dir.is_dir() {
        println!("[OK] Diagnostics directory: {}", dir.display());
    } else {
        println!(
            "[??] Diagnostics directory {} does not exist (created on first capture)",
            dir.display()
        );
    }

    println!();
    if chromium.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
    Ok(())
}
