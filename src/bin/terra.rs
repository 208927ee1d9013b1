use orrery::{run, terra};

fn main() -> anyhow::Result<()> {
    run(terra())
}
