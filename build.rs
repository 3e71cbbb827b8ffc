#[cfg(feature = "cuda")]
mod ptx {
    use ptx_builder::{builder::{BuildStatus, Builder, Profile},
                      error::Result,
                      reporter::BuildReporter};
    use std::env;
    use std::process::exit;

    pub fn main() {
        if let Err(error) = build() {
            eprintln!("{}", BuildReporter::report(error));
            exit(1);
        }
    }

    fn build() -> Result<()> {
        let mut builder = Builder::new("kernel")?;
        builder.set_profile(match env::var("PROFILE") {
            Ok(s) => match s.as_ref() {
                "debug" => Profile::Debug,
                _ => Profile::Release,
            },
            _ => Profile::Release,
        });

        match builder.build()? {
            BuildStatus::Success(output) => {
                println!(
                    "cargo:rustc-env=KERNEL_PTX_PATH={}",
                    output.get_assembly_path().display()
                );

                for path in output.source_files()? {
                    println!("cargo:rerun-if-changed={}", path.display());
                }
            }

            // we are the nested build of the kernel crate itself
            BuildStatus::NotNeeded => {
                println!("cargo:rustc-env=KERNEL_PTX_PATH=/dev/null");
            }
        };

        Ok(())
    }
}

fn main() {
    #[cfg(feature = "cuda")]
    ptx::main();

    println!("cargo:rerun-if-changed=build.rs");
}
