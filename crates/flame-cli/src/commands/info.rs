use crate::cli::InfoArgs;
use crate::error::Result;

pub fn run(args: InfoArgs) -> Result<()> {
    let machine = super::load_machine(&args.lattice)?;

    println!(
        "{:>5}  {:<20} {:<12} {:>10} {:>12}",
        "index", "name", "type", "L", "s_end"
    );
    let mut s = 0.0;
    for (index, element) in machine.elements().iter().enumerate() {
        s += element.length();
        println!(
            "{:>5}  {:<20} {:<12} {:>10.4} {:>12.4}",
            index,
            element.name(),
            element.kind().tag(),
            element.length(),
            s
        );
    }
    println!(
        "{} elements, total length {:.4}",
        machine.len(),
        machine.total_length()
    );
    Ok(())
}
