//! Build script that checks for the native OpenCV install and the model assets.
//!
//! Nothing here fails the build; missing pieces are reported as warnings with
//! install hints.

use std::env;
use std::path::Path;
use std::process::Command;

const MODEL_ASSETS: [&str; 2] = ["assets/face_detector.onnx", "assets/face_mesh.onnx"];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if !check_pkg_config() {
        return;
    }
    check_opencv();
    check_model_assets();

    println!("cargo:rustc-env=BUILD_TARGET={}", env::var("TARGET").unwrap_or_default());
}

fn pkg_config_version(package: &str) -> Option<String> {
    let output = Command::new("pkg-config").args(["--modversion", package]).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn check_pkg_config() -> bool {
    match Command::new("pkg-config").arg("--version").output() {
        Ok(output) if output.status.success() => true,
        _ => {
            println!("cargo:warning=pkg-config not found. It is needed to locate OpenCV.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install pkg-config");
            println!("cargo:warning=On macOS: brew install pkg-config");
            false
        }
    }
}

fn check_opencv() {
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    match pkg_config_version("opencv4").or_else(|| pkg_config_version("opencv")) {
        Some(version) => println!("cargo:warning=Found OpenCV version: {version}"),
        None => {
            println!("cargo:warning=OpenCV not found via pkg-config. Camera capture and the preview need it.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev clang libclang-dev");
            println!("cargo:warning=On macOS: brew install opencv");
        }
    }
}

fn check_model_assets() {
    let root = env::var("CARGO_MANIFEST_DIR").unwrap_or_default();
    for asset in MODEL_ASSETS {
        println!("cargo:rerun-if-changed={asset}");
        if !Path::new(&root).join(asset).exists() {
            println!("cargo:warning={asset} is missing. blink-mouse loads it at runtime unless the config points elsewhere.");
        }
    }
}
