use vergen::{BuildBuilder, CargoBuilder, Emitter, RustcBuilder};
use vergen_git2::Git2Builder;

// Emits the variables `causette version` prints.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::default().build_timestamp(true).build()?;
    let cargo = CargoBuilder::default().target_triple(true).build()?;
    let rustc = RustcBuilder::default().semver(true).build()?;

    let mut emitter = Emitter::default();
    emitter
        .add_instructions(&build)?
        .add_instructions(&cargo)?
        .add_instructions(&rustc)?;

    // Source tarballs have no repository to describe.
    match Git2Builder::default()
        .branch(true)
        .describe(true, true, None)
        .build()
    {
        Ok(git2) => {
            emitter.add_instructions(&git2)?;
        }
        Err(_) => {
            println!("cargo:rustc-env=VERGEN_GIT_BRANCH=unknown");
            println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE=unknown");
        }
    }
    emitter.emit()?;

    Ok(())
}
