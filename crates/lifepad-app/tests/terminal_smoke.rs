use std::process::Command;

#[test]
fn terminal_headless_smoke() {
    let bin = env!("CARGO_BIN_EXE_lifepad-app");
    let mut cmd = Command::new(bin);
    cmd.env("LIFEPAD_TERMINAL_HEADLESS", "1")
        .env("TERM", "xterm-256color")
        .env("RUST_LOG", "off");

    let status = cmd.status().expect("failed to run lifepad-app binary");
    assert!(status.success(), "terminal headless run failed");
}
