fn main() {
    // Embed build-time information, surfaced in each binary's startup log
    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        chrono::Utc::now().to_rfc3339()
    );
}
