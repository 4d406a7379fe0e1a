use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use icogen::{
    IcoDocument, ImageCrateSource, ResizeFilter, Size, SourceConfig,
};
use std::fs;
use std::path::PathBuf;
use std::process;

//===========================================================================//

fn main() {
    env_logger::init();
    let matches = App::new("icotool")
        .version("0.1")
        .about("Builds and inspects ICO files")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("create")
                .about("Creates an ICO file from GIF, JPEG or PNG files")
                .arg(
                    Arg::with_name("output")
                        .takes_value(true)
                        .value_name("PATH")
                        .short("o")
                        .long("output")
                        .help("Sets output path"),
                )
                .arg(
                    Arg::with_name("size")
                        .takes_value(true)
                        .value_name("SIZE")
                        .short("s")
                        .long("size")
                        .multiple(true)
                        .number_of_values(1)
                        .help("Adds a size, either N or WxH (repeatable)"),
                )
                .arg(
                    Arg::with_name("filter")
                        .takes_value(true)
                        .value_name("FILTER")
                        .long("filter")
                        .possible_values(&[
                            "nearest", "triangle", "catmullrom", "gaussian",
                            "lanczos3",
                        ])
                        .help("Sets the resampling filter"),
                )
                .arg(Arg::with_name("image").required(true).multiple(true)),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("Lists icons in an ICO file")
                .arg(Arg::with_name("ico").required(true)),
        )
        .get_matches();
    let result = if let Some(submatches) = matches.subcommand_matches("create")
    {
        create(submatches)
    } else if let Some(submatches) = matches.subcommand_matches("list") {
        list(submatches)
    } else {
        Ok(())
    };
    if let Err(error) = result {
        eprintln!("icotool: {}", error);
        process::exit(1);
    }
}

fn create(submatches: &ArgMatches) -> icogen::Result<()> {
    let out_path = if let Some(path) = submatches.value_of("output") {
        PathBuf::from(path)
    } else {
        let mut path = PathBuf::from("out.ico");
        let mut index: i32 = 0;
        while path.exists() {
            index += 1;
            path = PathBuf::from(format!("out{}.ico", index));
        }
        path
    };
    let mut sizes = Vec::<Size>::new();
    if let Some(values) = submatches.values_of("size") {
        for value in values {
            sizes.push(value.parse()?);
        }
    }
    let filter = match submatches.value_of("filter") {
        Some("nearest") => ResizeFilter::Nearest,
        Some("triangle") => ResizeFilter::Triangle,
        Some("catmullrom") => ResizeFilter::CatmullRom,
        Some("gaussian") => ResizeFilter::Gaussian,
        _ => ResizeFilter::Lanczos3,
    };
    let source = ImageCrateSource::new(SourceConfig { filter });
    let mut document = IcoDocument::new();
    if let Some(paths) = submatches.values_of("image") {
        for path in paths {
            println!("Adding {:?}", path);
            document.add_image(&source, path, &sizes)?;
        }
    }
    document.write_to_file(&out_path)?;
    println!("Wrote {} icons to {:?}", document.len(), out_path);
    Ok(())
}

fn list(submatches: &ArgMatches) -> icogen::Result<()> {
    let path = submatches.value_of("ico").unwrap_or_default();
    let file = fs::File::open(path)?;
    let document = IcoDocument::read(file)?;
    for (index, entry) in document.entries().iter().enumerate() {
        let kind = if entry.is_png() { "PNG" } else { "BMP" };
        println!(
            "{:5}: {}x{} {}, {} bpp, {} bytes",
            index,
            entry.width(),
            entry.height(),
            kind,
            entry.bits_per_pixel(),
            entry.payload_size()
        );
    }
    Ok(())
}

//===========================================================================//
