use std::path::PathBuf;

use eastlog::{Rotation, logger_config};

fn main() {
    let dir = PathBuf::from("/tmp/eastlog_example_rotation");
    let _ = std::fs::remove_dir_all(&dir);

    let logger = logger_config()
        .with_path(&dir)
        .with_application("demo")
        .with_rotation(Rotation::Daily)
        .with_stdout(true)
        .init_global()
        .unwrap();

    logger.info("startup", "direct call").unwrap();
    logger.call("warning", "startup", "named call").unwrap();
    for i in 0..5 {
        log::info!(target: "worker", "Log message number {i}");
    }

    // the rest of the run writes yearly files
    logger
        .set([
            ("rotate", "year"),
            ("format", "{<date>(Y-m-d H:i:s)} {level} {message}"),
        ])
        .unwrap();
    log::error!(target: "worker", "switched to yearly files");

    let mut files: Vec<String> = std::fs::read_dir(dir.join("demo"))
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    files.sort();

    println!("\n--- Rotation Summary ---");
    println!("Log directory: {}", dir.join("demo").display());
    for f in &files {
        println!("  {f}");
    }
    assert_eq!(files.len(), 2, "one daily and one yearly file");
}
