use ndext_frame::{DEFAULT_MAX_PAYLOAD, EXT32};
use ndext_registry::ExtRegistry;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("ndext {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: ndext");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("NDEXT_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("default_envelope: 0x{EXT32:02x}");
    println!("max_payload: {DEFAULT_MAX_PAYLOAD}");
    println!("registered_tags: {}", ExtRegistry::global().len());

    Ok(SUCCESS)
}
