//! vunit-ext - External buffers and typed values for VHDL simulations
//!
//! Command-line entry point for inspecting the type catalog, encoding and
//! decoding item wire forms, and trying out shifting resizes.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::{LevelFilter, Log, Metadata, Record};
use std::path::PathBuf;
use vunit_ext::codec::{byte_length_of, std_ulogic_from_char, std_ulogic_to_char, Fixed, Range};
use vunit_ext::{ArrayValue, DecodeOptions, ExtConfig, HandleTable, Item, TypeTag};

#[derive(Parser)]
#[command(name = "vunit-ext")]
#[command(version)]
#[command(about = "External buffers and typed values for VHDL simulations", long_about = None)]
struct Cli {
    /// Configuration file (default: search for vunit_ext.toml upwards)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an item wire form given as hex
    Decode {
        /// Tag byte followed by the encoded value
        hex: String,
    },

    /// Encode a value as an item and print its wire form as hex
    Encode {
        /// Type name, e.g. integer, string, std_ulogic_vector
        #[arg(short, long = "type")]
        type_name: String,

        /// Number vectors `n-1 downto 0` instead of ascending
        #[arg(long)]
        descending: bool,

        /// Value, or vector elements
        #[arg(allow_hyphen_values = true)]
        values: Vec<String>,
    },

    /// Print the encoded byte length of COUNT values of a type
    Length {
        #[arg(short, long = "type")]
        type_name: String,

        #[arg(short, long, default_value = "1")]
        count: usize,
    },

    /// Resize a scratch buffer with drop or rotate and print the result
    Shift {
        /// Initial elements, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        values: Vec<i32>,

        /// New length in elements
        #[arg(long)]
        length: usize,

        /// Value for elements not taken from the old buffer
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        fill: i32,

        #[arg(long, default_value = "0")]
        drop: usize,

        #[arg(long, default_value = "0")]
        rotate: usize,

        /// Use 32-bit integer elements instead of bytes
        #[arg(long)]
        int: bool,
    },

    /// List the type catalog
    Types {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

// =============================================================================
// Logging
// =============================================================================

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ExtConfig> {
    match path {
        Some(p) => ExtConfig::load(p).with_context(|| format!("Failed to load {}", p.display())),
        None => Ok(ExtConfig::load_from_cwd().unwrap_or_else(|e| {
            log::warn!("ignoring configuration: {}", e);
            ExtConfig::default()
        })),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Decode { hex } => cmd_decode(&hex, &config.decode_options()),
        Commands::Encode {
            type_name,
            descending,
            values,
        } => cmd_encode(&type_name, descending, &values),
        Commands::Length { type_name, count } => cmd_length(&type_name, count),
        Commands::Shift {
            values,
            length,
            fill,
            drop,
            rotate,
            int,
        } => cmd_shift(&config, &values, length, fill, drop, rotate, int),
        Commands::Types { json } => cmd_types(json),
    }
}

fn parse_tag(name: &str) -> Result<TypeTag> {
    TypeTag::from_name(name).with_context(|| format!("Unknown type: {}", name))
}

// =============================================================================
// Commands
// =============================================================================

fn cmd_types(json: bool) -> Result<()> {
    if json {
        let entries: Vec<serde_json::Value> = TypeTag::ALL
            .iter()
            .map(|t| {
                serde_json::json!({
                    "code": t.code(),
                    "name": t.name(),
                    "width_bits": t.width_bits(),
                    "element": t.element().map(|e| e.name()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{:>4}  {:<28} {:>5}  element", "code", "name", "width");
    for t in TypeTag::ALL {
        println!(
            "{:>4}  {:<28} {:>5}  {}",
            t.code(),
            t.name(),
            t.width_bits(),
            t.element().map_or("-", |e| e.name())
        );
    }
    Ok(())
}

fn cmd_length(type_name: &str, count: usize) -> Result<()> {
    let tag = parse_tag(type_name)?;
    println!("{}", byte_length_of(tag, count));
    Ok(())
}

fn cmd_encode(type_name: &str, descending: bool, values: &[String]) -> Result<()> {
    let tag = parse_tag(type_name)?;
    let item = if tag.is_vector() {
        let mut array = parse_array(tag, values)?;
        if descending {
            let n = array.len() as u32;
            let low = array.bounds.left.min(array.bounds.right);
            let bounds = if n == 0 {
                array.bounds
            } else {
                Range::downto(low.wrapping_add(n - 1), low)
            };
            array = array.with_bounds(bounds);
        }
        Item::from_array(&array, tag)?
    } else {
        Item::from_fixed(parse_fixed(tag, values)?)
    };
    log::info!("encoded {}", item);
    println!("{}", hex::encode(item.to_bytes()));
    Ok(())
}

fn cmd_decode(text: &str, options: &DecodeOptions) -> Result<()> {
    let bytes = hex::decode(text.trim()).context("Invalid hex input")?;
    let mut offset = 0;
    let item = Item::decode(&bytes, &mut offset).context("Failed to decode item")?;
    if offset != bytes.len() {
        bail!("{} trailing bytes after item", bytes.len() - offset);
    }
    let tag = item.tag();
    let value = if tag.is_vector() {
        format_array(tag, &item.to_array_with(tag, options)?)
    } else {
        format_fixed(&item.to_fixed(tag)?)
    };
    println!("{}: {}", tag, value);
    Ok(())
}

fn cmd_shift(
    config: &ExtConfig,
    values: &[i32],
    length: usize,
    fill: i32,
    drop: usize,
    rotate: usize,
    int: bool,
) -> Result<()> {
    let mut table = HandleTable::with_config(config.storage.clone());
    let result: Vec<i32> = if int {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let h = table.allocate(bytes.len(), Some(bytes.as_slice()), Some("shift"))?;
        table.resize_with_shift::<i32>(h, length, fill, drop, rotate)?;
        (0..length)
            .map(|i| table.get::<i32>(h, i))
            .collect::<Result<Vec<i32>, _>>()?
    } else {
        let bytes = values
            .iter()
            .map(|&v| u8::try_from(v).with_context(|| format!("{} does not fit in a byte", v)))
            .collect::<Result<Vec<u8>>>()?;
        let fill = u8::try_from(fill).with_context(|| format!("{} does not fit in a byte", fill))?;
        let h = table.allocate(bytes.len(), Some(bytes.as_slice()), Some("shift"))?;
        table.resize_with_shift::<u8>(h, length, fill, drop, rotate)?;
        table.raw(h)?.iter().map(|&b| i32::from(b)).collect()
    };
    let text: Vec<String> = result.iter().map(|v| v.to_string()).collect();
    println!("{}", text.join(","));
    Ok(())
}

// =============================================================================
// Value parsing and formatting
// =============================================================================

fn single<'a>(tag: TypeTag, values: &'a [String]) -> Result<&'a str> {
    match values {
        [v] => Ok(v.as_str()),
        _ => bail!("{} takes exactly one value, got {}", tag, values.len()),
    }
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => bail!("Invalid boolean: {}", s),
    }
}

fn parse_char(s: &str) -> Result<u8> {
    match s.as_bytes() {
        [c] => Ok(*c),
        _ => bail!("Expected a single character, got {:?}", s),
    }
}

fn parse_pair(s: &str) -> Result<(f64, f64)> {
    let (a, b) = s
        .split_once(',')
        .with_context(|| format!("Expected two comma separated reals, got {}", s))?;
    Ok((a.trim().parse()?, b.trim().parse()?))
}

/// `L to R` or `L downto R`
fn parse_range(s: &str) -> Result<Range> {
    let words: Vec<&str> = s.split_whitespace().collect();
    let (left, dir, right) = match words.as_slice() {
        [l, d, r] => (l.parse::<i32>()?, d.to_ascii_lowercase(), r.parse::<i32>()?),
        _ => bail!("Expected '<left> to|downto <right>', got {:?}", s),
    };
    match dir.as_str() {
        "to" => Ok(Range::to(left as u32, right as u32)),
        "downto" => Ok(Range::downto(left as u32, right as u32)),
        _ => bail!("Invalid direction: {}", dir),
    }
}

fn parse_std_ulogic(c: char) -> Result<u8> {
    std_ulogic_from_char(c).with_context(|| format!("Invalid std_ulogic value: {:?}", c))
}

fn parse_fixed(tag: TypeTag, values: &[String]) -> Result<Fixed> {
    if matches!(tag, TypeTag::NullType | TypeTag::Null) {
        return Ok(Fixed::Null);
    }
    if tag == TypeTag::Range {
        return Ok(Fixed::Range(parse_range(&values.join(" "))?));
    }
    let v = single(tag, values)?;
    let value = match tag {
        TypeTag::Boolean => Fixed::Boolean(parse_bool(v)?),
        TypeTag::Bit => Fixed::Bit(parse_bool(v)?),
        TypeTag::Character => Fixed::Character(parse_char(v)?),
        TypeTag::Integer => Fixed::Integer(v.parse()?),
        TypeTag::Real => Fixed::Real(v.parse()?),
        TypeTag::Time => Fixed::Time(v.parse()?),
        TypeTag::SeverityLevel => Fixed::SeverityLevel(v.parse()?),
        TypeTag::FileOpenKind => Fixed::FileOpenKind(v.parse()?),
        TypeTag::FileOpenStatus => Fixed::FileOpenStatus(v.parse()?),
        TypeTag::Complex => {
            let (re, im) = parse_pair(v)?;
            Fixed::Complex { re, im }
        }
        TypeTag::ComplexPolar => {
            let (mag, arg) = parse_pair(v)?;
            Fixed::ComplexPolar { mag, arg }
        }
        TypeTag::StdUlogic => {
            let c = v.chars().next().unwrap_or(' ');
            if v.chars().count() != 1 {
                bail!("Expected a single std_ulogic value, got {:?}", v);
            }
            Fixed::StdUlogic(parse_std_ulogic(c)?)
        }
        TypeTag::Type => Fixed::Type(parse_tag(v)?),
        TypeTag::Byte => Fixed::Byte(v.parse()?),
        TypeTag::IntegerVectorPtr => Fixed::IntegerVectorPtr(v.parse()?),
        TypeTag::StringPtr => Fixed::StringPtr(v.parse()?),
        other => bail!("{} is not a scalar type", other),
    };
    Ok(value)
}

fn parse_array(tag: TypeTag, values: &[String]) -> Result<ArrayValue> {
    let array = match tag.element() {
        Some(TypeTag::Character) => ArrayValue::from_text(&values.join(" ")),
        Some(TypeTag::Boolean) => {
            let bools = values.iter().map(|v| parse_bool(v)).collect::<Result<Vec<_>>>()?;
            ArrayValue::from_booleans(&bools)
        }
        Some(TypeTag::Bit) => {
            let bits = values
                .concat()
                .chars()
                .map(|c| parse_bool(&c.to_string()))
                .collect::<Result<Vec<_>>>()?;
            ArrayValue::from_booleans(&bits)
        }
        Some(TypeTag::StdUlogic) => {
            let codes = values
                .concat()
                .chars()
                .map(parse_std_ulogic)
                .collect::<Result<Vec<_>>>()?;
            ArrayValue::from_std_ulogic(&codes)
        }
        Some(TypeTag::Integer) => {
            let ints = values.iter().map(|v| v.parse()).collect::<Result<Vec<i32>, _>>()?;
            ArrayValue::from_integers(&ints)
        }
        Some(TypeTag::Real) => {
            let reals = values.iter().map(|v| v.parse()).collect::<Result<Vec<f64>, _>>()?;
            ArrayValue::from_reals(&reals)
        }
        Some(TypeTag::Time) => {
            let times = values.iter().map(|v| v.parse()).collect::<Result<Vec<i64>, _>>()?;
            ArrayValue::from_times(&times)
        }
        _ => bail!("{} is not a vector type", tag),
    };
    Ok(array)
}

fn format_fixed(value: &Fixed) -> String {
    match *value {
        Fixed::Null => "null".to_string(),
        Fixed::Boolean(b) => b.to_string(),
        Fixed::Bit(b) => (if b { "'1'" } else { "'0'" }).to_string(),
        Fixed::Character(c) => format!("{:?}", char::from(c)),
        Fixed::Integer(v) | Fixed::IntegerVectorPtr(v) | Fixed::StringPtr(v) => v.to_string(),
        Fixed::Real(v) => v.to_string(),
        Fixed::Time(v) => format!("{} fs", v),
        Fixed::SeverityLevel(v) | Fixed::FileOpenKind(v) | Fixed::FileOpenStatus(v) => {
            v.to_string()
        }
        Fixed::Byte(v) => v.to_string(),
        Fixed::Complex { re, im } => format!("({}, {})", re, im),
        Fixed::ComplexPolar { mag, arg } => format!("({}, {})", mag, arg),
        Fixed::StdUlogic(v) => format!("'{}'", std_ulogic_to_char(v)),
        Fixed::Type(t) => t.name().to_string(),
        Fixed::Range(r) => r.to_string(),
    }
}

fn format_array(tag: TypeTag, array: &ArrayValue) -> String {
    let bounds = array.bounds;
    let body = match tag.element() {
        Some(TypeTag::Character) => format!("{:?}", array.text()),
        Some(TypeTag::Boolean) => {
            let items: Vec<String> = array.booleans().iter().map(|b| b.to_string()).collect();
            format!("({})", items.join(", "))
        }
        Some(TypeTag::Bit) => {
            let bits: String = array
                .booleans()
                .iter()
                .map(|&b| if b { '1' } else { '0' })
                .collect();
            format!("\"{}\"", bits)
        }
        Some(TypeTag::StdUlogic) => {
            let chars: String = array.std_ulogic().into_iter().map(std_ulogic_to_char).collect();
            format!("\"{}\"", chars)
        }
        Some(TypeTag::Integer) => join_values(array.integers()),
        Some(TypeTag::Real) => join_values(array.reals()),
        Some(TypeTag::Time) => join_values(array.times()),
        _ => hex::encode(&array.elements),
    };
    format!("({}) {}", bounds, body)
}

fn join_values<T: ToString>(values: Vec<T>) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("({})", items.join(", "))
}
