// Main entry point - all the logic is in lib.rs and shader.wgsl

use outline_glow::{error::InitError, run};

fn main() -> Result<(), InitError> {
    run()
}
