use clap::Parser as ClapParser;
use std::path::PathBuf;
use std::process;

use vm::image::load_image_header;
use vm::lookup::lookup_method;
use vm::special::bootstrap;
use vm::{demo, Vm, VmCreateInfo};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Image file to load
    #[arg(required = false, help = "The image file to run")]
    image: Option<PathBuf>,

    /// Run `10 factorial` on a fresh VM instead of loading an image
    #[arg(long, help = "Run the factorial demo, no image needed")]
    demo: bool,

    /// Print the bytecode of the program before running it
    #[arg(long, help = "Dump literals + bytecode of the executed method")]
    dump_bytecode: bool,

    /// Maximum nesting of activations
    #[arg(long, default_value_t = VmCreateInfo::default().max_depth)]
    max_depth: usize,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let info = VmCreateInfo {
        max_depth: cli.max_depth,
        ..VmCreateInfo::default()
    };

    let result = if cli.demo {
        let mut vm = bootstrap(info);
        let result = demo::run_factorial_demo(&mut vm);
        dump(&vm, &cli, "factorial");
        result.map(|value| vm.print_string(value))
    } else {
        let Some(path) = &cli.image else {
            eprintln!("Usage: smalltalk <image-file>");
            eprintln!("       smalltalk --demo");
            process::exit(1);
        };
        if let Err(err) = load_image_header(path) {
            eprintln!("Error loading image '{}': {}", path.display(), err);
            process::exit(1);
        }
        let mut vm = bootstrap(info);
        let doit = demo::boot_doit(&vm);
        let method = doit.build(&mut vm);
        if cli.dump_bytecode {
            println!("== doit ==");
            print!("{}", vm.disassemble(method));
        }
        vm.execute_method(method, object::Value::NIL, Vec::new())
            .map(|value| vm.print_string(value))
    };

    match result {
        Ok(printed) => println!("Final result: {printed}"),
        Err(err) => {
            eprintln!("Error executing: {err}");
            process::exit(1);
        }
    }
}

fn dump(vm: &Vm, cli: &Cli, selector: &str) {
    if !cli.dump_bytecode {
        return;
    }
    let integer = vm.special.integer;
    if let Some(method) = lookup_method(vm, integer, selector) {
        println!("== Integer>>{selector} ==");
        print!("{}", vm.disassemble(method));
    }
}
