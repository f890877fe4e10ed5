fn main() -> anyhow::Result<()> {
    keel_lib::main()
}
