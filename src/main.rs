use std::io::BufReader;
use std::fs::File;

use pdfrw::{Object, Reader, ReadOptions};

fn main() -> Result<(), pdfrw::Error> {
    stderrlog::new()
        .verbosity(log::Level::Warn)
        .init()
        .unwrap();

    let Some(fname) = std::env::args().nth(1) else {
        println!("Usage: {} filename [--strict]", std::env::args().next().unwrap());
        return Ok(())
    };
    let options = ReadOptions::default().with_strict(std::env::args().any(|arg| arg == "--strict"));

    let rdr = Reader::with_options(BufReader::new(File::open(fname)?), options)?;
    let (major, minor) = rdr.version();
    println!("PDF {major}.{minor}, trailer: {}", Object::Dict(rdr.trailer().clone()));
    for (objref, res) in rdr.objects() {
        match res {
            Ok(obj) => {
                println!("{objref}: {obj}");
                let Object::Stream(stm) = &*obj else { continue };
                match rdr.stream_data(stm) {
                    Ok(data) => {
                        println!("--v--v--v--");
                        for &c in data {
                            match c {
                                0x20..=0x7E | b'\n' => print!("{}", c as char),
                                _ => print!("\x1B[7m<{:02x}>\x1B[0m", c)
                            }
                        }
                        println!("\n--^--^--^--");
                    },
                    Err(err) => println!("(stream data: {err})")
                }
            },
            Err(err) => println!("{objref}: {err}")
        }
    }
    match rdr.page_count() {
        Ok(count) => println!("{count} pages"),
        Err(err) => println!("page tree: {err}")
    }
    Ok(())
}
