use mat_reader::{ArrayValue, MatFile, Variable};
use std::env;

fn describe(variable: &Variable) -> String {
    let array = &variable.array;
    let mut line = format!(
        "{} [{}] {}",
        variable.name,
        array.dimensions,
        array.class()
    );
    if array.is_complex() {
        line.push_str(" complex");
    }
    if array.is_logical() {
        line.push_str(" logical");
    }
    if variable.is_global {
        line.push_str(" (global)");
    }
    match &array.value {
        ArrayValue::Struct(fields) | ArrayValue::Object { fields, .. } => {
            let names: Vec<&str> = fields.field_names().collect();
            line.push_str(&format!(" fields: {}", names.join(", ")));
        }
        ArrayValue::Opaque { class_name, .. } => {
            line.push_str(&format!(" object of class {}", class_name));
        }
        ArrayValue::Char(text) if text.len() <= 40 => {
            line.push_str(&format!(" = {:?}", text));
        }
        _ => {}
    }
    line
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <path-to-mat-file>", args[0]);
        std::process::exit(1);
    }

    let mat_path = &args[1];
    println!("Reading MAT file: {}", mat_path);
    println!("{}", "=".repeat(60));

    match MatFile::open(mat_path) {
        Ok(mat) => {
            let header = mat.header();
            println!("  Text: {}", header.text);
            println!("  Version: {:#06x}", header.version);
            println!("  Byte order: {}", header.endian);
            if let Some(offset) = header.subsystem_offset {
                println!("  Subsystem data at offset: {}", offset);
            }

            println!("\nVariables ({}):", mat.len());
            for variable in mat.variables() {
                println!("  {}", describe(variable));
            }

            let classes = mat.subsystem().class_names();
            if !classes.is_empty() {
                println!("\nObject classes: {}", classes.join(", "));
            }
        }
        Err(e) => {
            eprintln!("\nERROR: Failed to read MAT file");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
