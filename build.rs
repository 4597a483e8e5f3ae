//! Build script for detecting system dependencies and providing installation guidance.
//!
//! Checks for OpenCV, the X11 XTEST extension and pkg-config, and prints
//! installation hints for whatever is missing.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if !check_pkg_config() {
        // Nothing else can be looked up
        return;
    }

    check_opencv();

    // Wheel and click injection on Linux
    check_x11();
}

fn pkg_config(args: &[&str]) -> Option<String> {
    Command::new("pkg-config")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn check_pkg_config() -> bool {
    if pkg_config(&["--version"]).is_some() {
        return true;
    }

    println!("cargo:warning=pkg-config not found. This is required to find system libraries.");
    println!("cargo:warning=On Ubuntu: sudo apt-get install pkg-config");
    println!("cargo:warning=On macOS: brew install pkg-config");
    false
}

fn check_opencv() {
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    match ["opencv4", "opencv"]
        .iter()
        .find_map(|name| pkg_config(&["--modversion", name]))
    {
        Some(version) => println!("cargo:warning=Found OpenCV version: {version}"),
        None => {
            println!("cargo:warning=OpenCV not found via pkg-config. Camera capture and the overlay window need it.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev");
            println!("cargo:warning=On macOS: brew install opencv");
        }
    }
}

fn check_x11() {
    if !env::var("TARGET").unwrap_or_default().contains("linux") {
        return;
    }

    for (library, package) in [("x11", "libx11-dev"), ("xtst", "libxtst-dev")] {
        if pkg_config(&["--exists", library]).is_none() {
            println!("cargo:warning={library} not found. Scroll and pause actions need an X server with XTEST; use --dispatcher log otherwise.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install {package}");
        }
    }
}
