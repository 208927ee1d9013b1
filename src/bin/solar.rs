use orrery::{run, solar};

fn main() -> anyhow::Result<()> {
    run(solar())
}
