//! Replay a script and save the drawing (native).

#[cfg(feature = "native")]
fn main() {
    env_logger::init();
    log::info!("Starting Inkling");

    let mut args = std::env::args().skip(1);
    let Some(script_path) = args.next() else {
        eprintln!("Usage: inkling <script.json> [out_dir]");
        std::process::exit(2);
    };
    let out_dir = std::path::PathBuf::from(args.next().unwrap_or_else(|| "out".to_string()));

    if let Err(err) = run(&script_path, &out_dir) {
        log::error!("{err}");
        eprintln!("inkling: {err}");
        std::process::exit(1);
    }
}

#[cfg(feature = "native")]
fn run(script_path: &str, out_dir: &std::path::Path) -> Result<(), inkling_app::ReplayError> {
    let script = inkling_app::Script::from_file(script_path)?;
    let session = inkling_app::replay(&script)?;
    if session.save_requests > 1 {
        log::debug!("Script requested {} saves; writing one", session.save_requests);
    }

    let timestamp_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    match pollster::block_on(inkling_app::save_to_dir(&session.surface, out_dir, timestamp_ms))? {
        inkling_core::SaveOutcome::Published(path) => println!("{path}"),
        inkling_core::SaveOutcome::SavedLocally(path) => println!("{path}"),
        inkling_core::SaveOutcome::Failed(err) => return Err(inkling_core::SurfaceError::from(err).into()),
    }
    Ok(())
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
