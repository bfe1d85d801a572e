use anyhow::*;

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=shaders/quad/src");
    println!("cargo:rerun-if-changed=shaders/shared/src");

    // The CPU side runs the shader crates as plain Rust, SPIR-V is only
    // needed by the viewer.
    #[cfg(feature = "gpu")]
    build_shader("shaders/quad")?;

    Ok(())
}

#[cfg(feature = "gpu")]
fn build_shader(path_to_crate: &str) -> Result<()> {
    use spirv_builder::{MetadataPrintout, SpirvBuilder};
    use std::path::Path;

    let builder_dir = &Path::new(env!("CARGO_MANIFEST_DIR"));
    let path_to_crate = builder_dir.join(path_to_crate);
    SpirvBuilder::new(path_to_crate, "spirv-unknown-vulkan1.2")
        .print_metadata(MetadataPrintout::Full)
        .build()
        .context("failed to compile the quad shader crate to SPIR-V")?;
    Ok(())
}
