use std::process::exit;

use clap::{App, Arg};

mod test;
mod testrunner;
mod variables;

use testrunner::{Testrunner, TestrunnerOptions};
use variables::VariableMap;

fn main() {
    let cli_args = App::new("smoke")
        .version("1.0")
        .about("Runs directory-defined smoke tests: each test case holds a shell command and optional expected outputs")
        .arg(
            Arg::with_name("target-dir")
                .long("target-dir")
                .value_name("DIR")
                .default_value("target")
                .help("Build directory"),
        )
        .arg(
            Arg::with_name("smoke-dir")
                .long("smoke-dir")
                .value_name("DIR")
                .default_value("smoke")
                .help("Smoke tests directory"),
        )
        .arg(
            Arg::with_name("work-dir")
                .long("work-dir")
                .value_name("DIR")
                .takes_value(true)
                .help("Temporary work directory"),
        )
        .arg(
            Arg::with_name("output")
                .long("output")
                .value_name("FILE")
                .takes_value(true)
                .help("Output file for verbose logs"),
        )
        .arg(
            Arg::with_name("keep-work-dir")
                .long("keep-work-dir")
                .help("Keep the work directory after tests"),
        )
        .arg(
            Arg::with_name("list")
                .long("list")
                .help("List all available tests"),
        )
        .arg(
            Arg::with_name("test")
                .long("test")
                .value_name("NAME")
                .takes_value(true)
                .help("Run only the specified test"),
        )
        .arg(
            Arg::with_name("variable")
                .long("variable")
                .value_name("VAR=VAL")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .help("Set variable VAR=VAL"),
        )
        .arg(
            Arg::with_name("variables")
                .long("variables")
                .help("List all variables"),
        )
        .get_matches();

    let target_dir = cli_args.value_of("target-dir").unwrap_or("target");
    let smoke_dir = cli_args.value_of("smoke-dir").unwrap_or("smoke");
    let work_dir = cli_args.value_of("work-dir");

    let mut builder = VariableMap::builder(target_dir, smoke_dir, work_dir);
    let mut explicit_work_dir = work_dir.is_some();
    if let Some(overrides) = cli_args.values_of("variable") {
        for var_val in overrides {
            match var_val.find('=') {
                Some(idx) => {
                    let (key, value) = (&var_val[..idx], &var_val[idx + 1..]);
                    if key == "WORK_DIR" {
                        explicit_work_dir = true;
                    }
                    builder.set(key, value);
                }
                None => {
                    eprintln!("Invalid variable format: {}", var_val);
                    exit(1);
                }
            }
        }
    }
    let variables = builder.build();

    if cli_args.is_present("variables") {
        for (key, value) in variables.iter() {
            println!("{}={}", key, value);
        }
        return;
    }

    let options = TestrunnerOptions {
        smoke_dir: smoke_dir.to_owned(),
        output: cli_args.value_of("output").map(str::to_owned),
        keep_work_dir: cli_args.is_present("keep-work-dir"),
        explicit_work_dir,
    };
    let runner = Testrunner::new(options, variables);

    let result = if cli_args.is_present("list") {
        runner.list_tests()
    } else {
        runner.run_tests(cli_args.value_of("test"))
    };
    if let Err(err) = result {
        eprintln!("{}", err);
        exit(1);
    }
}
