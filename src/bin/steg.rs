// SPDX-License-Identifier: LGPL-3.0-or-later
/*
 * bpcs - bin/steg.rs
 *
 * Copyright (C) 2023 Hubert Figuière
 *
 * This library is free software: you can redistribute it and/or
 * modify it under the terms of the GNU Lesser General Public License
 * as published by the Free Software Foundation, either version 3 of
 * the License, or (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
 * Lesser General Public License for more details.
 *
 * You should have received a copy of the GNU Lesser General Public
 * License along with this library.  If not, see
 * <http://www.gnu.org/licenses/>.
 */

use std::io::{Read, Write};

use getopts::{Matches, Options};
use log::LevelFilter;
use rand::RngCore;
use simple_logger::SimpleLogger;

use bpcs::{BitPlaneCaps, Error, HideStats, Result};

const FLAG_NAMES: [&str; 5] = ["hide", "extract", "measure", "help", "d"];
const VALUE_NAMES: [&str; 10] = ["c", "m", "o", "s", "t", "random", "rmax", "gmax", "bmax", "amax"];

pub fn main() {
    let args: Vec<String> = std::env::args().collect();

    if let Err(err) = run(&args) {
        eprintln!("ERROR: {}", err);
        print_usage(&args[0]);
        std::process::exit(1);
    }
}

fn build_opts() -> Options {
    let mut opts = Options::new();
    opts.optflag("", "hide", "Hide message in cover image");
    opts.optflag("", "extract", "Extract hidden message");
    opts.optflag("", "measure", "Measure hiding capacity of an image");
    opts.optflag("", "help", "Display this help message");
    opts.optflag("d", "", "Debug output");
    opts.optopt("c", "", "Cover image to hide message in", "FILE");
    opts.optopt(
        "m",
        "",
        "Message file to hide, '-' reads standard input. Exclusive with --random",
        "FILE",
    );
    opts.optopt(
        "",
        "random",
        "Fill cover file with COUNT random bytes. Exclusive with -m",
        "COUNT",
    );
    opts.optopt(
        "o",
        "",
        "Name of output file, '-' writes an extracted message to standard output",
        "FILE",
    );
    opts.optopt("s", "", "Stego file to extract hidden message from", "FILE");
    opts.optopt(
        "t",
        "",
        "Complexity threshold [0, 0.5]. default=dynamic threshold",
        "VAL",
    );
    opts.optopt("", "rmax", "Max red bitplanes to use ([0,8], default=8)", "N");
    opts.optopt("", "gmax", "Max green bitplanes to use ([0,8], default=8)", "N");
    opts.optopt("", "bmax", "Max blue bitplanes to use ([0,8], default=8)", "N");
    opts.optopt("", "amax", "Max alpha bitplanes to use ([0,8], default=8)", "N");
    opts
}

fn run(args: &[String]) -> Result<()> {
    let opts = build_opts();
    let matches = opts
        .parse(&args[1..])
        .map_err(|err| Error::InvalidArgument(err.to_string()))?;

    if let Some(unexpected) = matches.free.first() {
        return Err(Error::InvalidArgument(format!(
            "unexpected argument {}",
            unexpected
        )));
    }

    let loglevel = if matches.opt_present("d") {
        LevelFilter::Debug
    } else {
        LevelFilter::Error
    };
    SimpleLogger::new().with_level(loglevel).init().unwrap();

    if matches.opt_present("help") {
        // if help is present, we don't care about anything else
        print_help(&args[0], &opts);
        return Ok(());
    }

    check_mode_args(&matches)?;

    if matches.opt_present("hide") {
        hide(&matches)
    } else if matches.opt_present("extract") {
        extract(&matches)
    } else {
        measure(&matches)
    }
}

fn display_name(name: &str) -> String {
    if name.len() == 1 {
        format!("-{}", name)
    } else {
        format!("--{}", name)
    }
}

/// Exactly one mode, its required options present, nothing beyond its
/// allowed options.
fn check_mode_args(matches: &Matches) -> Result<()> {
    let num_modes = ["hide", "extract", "measure"]
        .iter()
        .filter(|mode| matches.opt_present(mode))
        .count();
    if num_modes == 0 {
        return Err(Error::InvalidArgument(
            "no mode selected (--hide, --extract or --measure)".into(),
        ));
    }
    if num_modes > 1 {
        return Err(Error::InvalidArgument(
            "multiple modes selected (choose one of --hide, --extract or --measure)".into(),
        ));
    }

    let (required, optional): (&[&str], &[&str]) = if matches.opt_present("hide") {
        if matches.opt_present("random") {
            (
                &["hide", "random", "c", "o"],
                &["t", "rmax", "gmax", "bmax", "amax"],
            )
        } else {
            (
                &["hide", "m", "c", "o"],
                &["t", "rmax", "gmax", "bmax", "amax"],
            )
        }
    } else if matches.opt_present("extract") {
        (&["extract", "s", "o"], &[])
    } else {
        (&["measure", "c", "t"], &["rmax", "gmax", "bmax", "amax"])
    };

    for name in required {
        if !matches.opt_present(name) {
            return Err(Error::InvalidArgument(format!(
                "missing argument {}",
                display_name(name)
            )));
        }
    }

    for name in FLAG_NAMES.iter().chain(&VALUE_NAMES) {
        if matches.opt_present(name)
            && *name != "d"
            && !required.contains(name)
            && !optional.contains(name)
        {
            return Err(Error::InvalidArgument(format!(
                "unexpected argument {}",
                display_name(name)
            )));
        }
    }

    Ok(())
}

fn integer_arg(matches: &Matches, name: &str, default: i64, low: i64, high: i64) -> Result<i64> {
    let value = match matches.opt_str(name) {
        None => return Ok(default),
        Some(raw) => raw.parse::<i64>().ok(),
    };
    value.filter(|v| (low..=high).contains(v)).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "{} should be integer in range [{}, {}]",
            display_name(name),
            low,
            high
        ))
    })
}

fn float_arg(matches: &Matches, name: &str, default: f32, low: f32, high: f32) -> Result<f32> {
    let value = match matches.opt_str(name) {
        None => return Ok(default),
        Some(raw) => raw.parse::<f32>().ok(),
    };
    value.filter(|v| (low..=high).contains(v)).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "{} should be real number in range [{}, {}]",
            display_name(name),
            low,
            high
        ))
    })
}

fn caps_args(matches: &Matches) -> Result<BitPlaneCaps> {
    let rmax = integer_arg(matches, "rmax", 8, 0, 8)?;
    let gmax = integer_arg(matches, "gmax", 8, 0, 8)?;
    let bmax = integer_arg(matches, "bmax", 8, 0, 8)?;
    let amax = integer_arg(matches, "amax", 8, 0, 8)?;
    BitPlaneCaps::new(rmax as u8, gmax as u8, bmax as u8, amax as u8)
}

fn hide(matches: &Matches) -> Result<()> {
    let cover_file = matches.opt_str("c").unwrap();
    let output_file = matches.opt_str("o").unwrap();
    if !bpcs::supported_output(&output_file) {
        return Err(Error::InvalidArgument(
            "output file extension must be one of bmp, png or tga".into(),
        ));
    }

    let caps = caps_args(matches)?;
    let threshold = if matches.opt_present("t") {
        Some(float_arg(matches, "t", 0.0, 0.0, 0.5)?)
    } else {
        None
    };

    let message = if matches.opt_present("random") {
        let count = integer_arg(matches, "random", 0, 0, 2_000_000_000)?;
        random_bytes(count as usize)
    } else {
        let message_file = matches.opt_str("m").unwrap();
        if message_file == "-" {
            // read message from standard input, instead of a file
            let mut message = Vec::new();
            std::io::stdin().read_to_end(&mut message)?;
            message
        } else {
            std::fs::read(&message_file)?
        }
    };

    let mut img = bpcs::load_image(&cover_file)?;
    let stats = bpcs::hide_message(&mut img, &message, caps, threshold)?;
    bpcs::save_image(&output_file, &img)?;
    println!("success writing {}", output_file);

    show_stats(&stats, false);
    Ok(())
}

fn extract(matches: &Matches) -> Result<()> {
    let stego_file = matches.opt_str("s").unwrap();
    let output_file = matches.opt_str("o").unwrap();

    let img = bpcs::load_image(&stego_file)?;
    let message = bpcs::unhide_message(&img)?;

    if output_file == "-" {
        // write message to standard output, instead of a file
        std::io::stdout().write_all(&message)?;
    } else {
        std::fs::write(&output_file, &message)?;
        println!("extracted {} bytes to {}", message.len(), output_file);
    }
    Ok(())
}

fn measure(matches: &Matches) -> Result<()> {
    let cover_file = matches.opt_str("c").unwrap();
    let threshold = float_arg(matches, "t", 0.3, 0.0, 0.5)?;
    let caps = caps_args(matches)?;

    let img = bpcs::load_image(&cover_file)?;
    let stats = bpcs::measure_capacity(threshold, &img, caps)?;

    show_stats(&stats, true);
    Ok(())
}

fn random_bytes(count: usize) -> Vec<u8> {
    let mut bytes = vec![0_u8; count];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn show_stats(stats: &HideStats, measure_mode: bool) {
    if measure_mode {
        println!("total capacity: {}", stats.message_bytes_hidden);
    } else {
        println!(
            "bytes hidden: {}/{}",
            stats.message_bytes_hidden, stats.message_size
        );
    }
    println!("complexity threshold: {}", stats.threshold);
    println!("chunks per bitplane: {}", stats.chunks_per_bitplane);
    println!("chunks used per bitplane (MSB->LSB):");
    println!("              red            green             blue            alpha");
    for bit in 0..8 {
        let mut line = String::new();
        for channel in 0..4 {
            let used = stats.chunks_used_per_bitplane[channel * 8 + bit];
            let percent = if stats.chunks_per_bitplane != 0 {
                100.0 * used as f32 / stats.chunks_per_bitplane as f32
            } else {
                0.0
            };
            let cell = format!("{}{:>9}", used, format!("({:.2}%)", percent));
            line.push_str(&format!("{:>17}", cell));
        }
        println!("{}", line);
    }
}

fn exe_short_name(argv0: &str) -> &str {
    std::path::Path::new(argv0)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(argv0)
}

fn print_usage(argv0: &str) {
    let exe = exe_short_name(argv0);

    println!("Usage:");
    println!(
        "    {} --hide -m <message file> -c <cover file> -o <stego file> [-t <threshold>]",
        exe
    );
    println!("        [--rmax <n>] [--gmax <n>] [--bmax <n>] [--amax <n>]");
    println!(
        "    {} --hide --random <count> -c <cover file> -o <stego file> [-t <threshold>]",
        exe
    );
    println!("        [--rmax <n>] [--gmax <n>] [--bmax <n>] [--amax <n>]");
    println!("    {} --extract -s <stego file> -o <message file>", exe);
    println!("    {} --measure -c <cover file> -t <threshold>", exe);
    println!("        [--rmax <n>] [--gmax <n>] [--bmax <n>] [--amax <n>]");
    println!("    {} --help", exe);
    println!();
    println!("(try --help for more details)");
}

fn print_help(argv0: &str, opts: &Options) {
    print_usage(argv0);

    let exe = exe_short_name(argv0);
    println!("{}", opts.usage(""));
    println!("Examples:");
    println!("  {} --hide -c cover.jpg -m message.txt --amax 0 -o hidden.png", exe);
    println!("       Hide message.txt in cover.jpg. Do not use any bitplanes from the");
    println!("       alpha channel. Output to hidden.png");
    println!();
    println!("  {} --extract -s hidden.png -o extracted.txt", exe);
    println!("       Extract a hidden message from hidden.png. Output to extracted.txt");
    println!();
    println!("  {} --measure -c cover.bmp -t 0.3 --rmax 4 --gmax 4 --bmax 4 --amax 2", exe);
    println!("       Measure the hiding capacity for cover.bmp at complexity threshold");
    println!("       = 0.3, using 4 bitplanes each for the red, green and blue channels,");
    println!("       and 2 bitplanes for the alpha channel.");
    println!();
    println!("  {} --hide -c cover.png -m - -o hidden.tga", exe);
    println!("       Read a message from standard input (note the '-' in place of a");
    println!("       filename), hide it in cover.png, output to hidden.tga. The");
    println!("       message can also be piped in this way.");
    println!();
    println!("  {} --extract -s hidden.tga -o -", exe);
    println!("       Extract hidden message and output to standard output. Not");
    println!("       recommended on Windows unless you know for sure that the");
    println!("       hidden message is text.");
    println!();
    println!("  {} --hide -c cover.jpg --random 10000 -o hidden.png", exe);
    println!("       Hide 10000 random bytes in cover.jpg. Output to hidden.png.");
}
