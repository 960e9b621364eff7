use std::fs;
use std::process::ExitCode;

use clap::Parser;

use nesdecomp::cli::Cli;

fn run(cli: Cli) -> nesdecomp::Result<()> {
    let bytes = fs::read(&cli.input).map_err(|err| {
        nesdecomp::AnalyzerError::InvalidFormat(format!("could not read {}: {}", cli.input.display(), err))
    })?;

    let rom = nesdecomp::load_rom(&bytes)?;
    let report = nesdecomp::analyze(rom)?;

    let stem = cli
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());

    fs::create_dir_all(&cli.output).map_err(|err| {
        nesdecomp::AnalyzerError::InvalidFormat(format!("could not create {}: {}", cli.output.display(), err))
    })?;

    if cli.disassemble {
        let listing = nesdecomp::emit_asm(&report);
        let path = cli.output.join(format!("{}.asm", stem));
        fs::write(&path, listing)
            .map_err(|err| nesdecomp::AnalyzerError::InvalidFormat(format!("could not write {}: {}", path.display(), err)))?;
        println!("{}", path.display());
    }

    if cli.should_decompile() {
        let emitted = nesdecomp::emit_c(&report);
        let c_path = cli.output.join(format!("{}.c", stem));
        let h_path = cli.output.join(format!("{}.h", stem));
        fs::write(&c_path, emitted.c_source)
            .map_err(|err| nesdecomp::AnalyzerError::InvalidFormat(format!("could not write {}: {}", c_path.display(), err)))?;
        fs::write(&h_path, emitted.header)
            .map_err(|err| nesdecomp::AnalyzerError::InvalidFormat(format!("could not write {}: {}", h_path.display(), err)))?;
        println!("{}", c_path.display());
        println!("{}", h_path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new().filter_level(cli.log_level_filter()).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", ansi_term::Colour::Red.paint(err.to_string()));
            ExitCode::FAILURE
        }
    }
}
