fn main() -> anyhow::Result<()> {
    turnup::app::run()
}
