//! `ldecomp` entry point: load a compiled module file, decompile its
//! top-level code object, print the reconstructed source to stdout.

use std::fs;
use std::process::ExitCode;

use clap::Parser;

use ldecomp::{decompile_code, dictionary, format_lines, loader};

/// Reconstructs source text for a dynamically-typed scripting language
/// from its compiled code objects.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Compiled module file to decompile
    module_file: String,

    /// Also print the disassembly of the decompiled code object to
    /// stderr, even when decompilation succeeds
    #[arg(long, default_value_t = false)]
    dump_disassembly: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let data = match fs::read(&args.module_file) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("error: failed to read '{}': {}", args.module_file, err);
            return ExitCode::FAILURE;
        }
    };

    let (version, code) = match loader::load_module(&data) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let code = std::rc::Rc::new(code);
    if args.dump_disassembly {
        eprintln!("-- disassembly of `{}` --", code.name);
        eprint!("{}", dictionary::disassemble(&code.instructions));
    }

    match decompile_code(code, version) {
        Ok(lines) => {
            println!("{}", format_lines(&lines));
            ExitCode::SUCCESS
        }
        Err(err) => {
            // decompile_code already dumped the failing code object's
            // disassembly to stderr.
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
