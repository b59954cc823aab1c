use anyhow::Result;

fn main() -> Result<()> {
    modgraph_lib::main()
}
