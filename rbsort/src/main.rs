use std::cmp::max;
use std::io;
use std::io::BufRead;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{LevelFilter, debug, error, info};
use rbset::{DuplicateHandling, Rbtree};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use unicode_width::UnicodeWidthStr;

#[derive(clap::Parser)]
#[command(name = "rbsort", about = "Sorts and inspects lines from stdin.")]
struct Opt {
    #[arg(long)]
    /// Keep the last of several equal lines instead of the first.
    replace: bool,

    #[arg(short, long)]
    /// Log rejected duplicates and missing removals to stderr.
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the distinct lines in sorted order.
    Sort {
        #[arg(long)]
        /// Print in descending order.
        reverse: bool,
    },
    /// Print the number of lines and the shape of the tree holding them.
    Stats,
    /// Report whether each ITEM was among the input lines.
    Check { items: Vec<String> },
    /// Remove each ITEM from the input lines and print the rest in sorted order.
    Remove { items: Vec<String> },
}

fn main() -> ExitCode {
    let opt = Opt::parse();

    let level = if opt.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    if let Err(e) =
        TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)
    {
        eprintln!("Failed to initialize logging: {e}");
    }

    let duplicates =
        if opt.replace { DuplicateHandling::Replace } else { DuplicateHandling::Reject };

    let (mut tree, rejected) = match load(duplicates) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("Failed to read stdin: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = tree.validate() {
        error!("Tree is corrupt after loading: {e}");
        return ExitCode::FAILURE;
    }

    match opt.cmd {
        Command::Sort { reverse } => sort(&tree, reverse),
        Command::Stats => stats(&tree, rejected),
        Command::Check { items } => check(&tree, &items),
        Command::Remove { items } => {
            remove(&mut tree, &items);
            sort(&tree, false);
        }
    }

    ExitCode::SUCCESS
}

fn load(duplicates: DuplicateHandling) -> io::Result<(Rbtree<String>, usize)> {
    let mut tree = Rbtree::with_duplicates(duplicates);
    let mut rejected = 0;

    for line in io::stdin().lock().lines() {
        let line = line?;
        if !tree.insert(line.clone()) {
            debug!("Duplicate line {line:?}");
            rejected += 1;
        }
    }

    info!("Loaded {} lines, {rejected} duplicates", tree.len());
    Ok((tree, rejected))
}

fn sort(tree: &Rbtree<String>, reverse: bool) {
    if reverse {
        tree.iter().rev().for_each(|s| println!("{s}"));
    } else {
        tree.iter().for_each(|s| println!("{s}"));
    }
}

fn stats(tree: &Rbtree<String>, rejected: usize) {
    let (black, red) = tree.color_counts();
    let bound = 2.0 * ((tree.len() + 1) as f64).log2();

    print(vec![
        ("lines".to_owned(), tree.len().to_string()),
        ("duplicates".to_owned(), rejected.to_string()),
        ("height".to_owned(), tree.height().to_string()),
        ("height bound".to_owned(), format!("{bound:.2}")),
        ("black nodes".to_owned(), black.to_string()),
        ("red nodes".to_owned(), red.to_string()),
    ]);
}

fn check(tree: &Rbtree<String>, items: &[String]) {
    let rows = items
        .iter()
        .map(|s| {
            let found = if tree.contains(s) { "found" } else { "missing" };
            (s.clone(), found.to_owned())
        })
        .collect();

    print(rows);
}

fn remove(tree: &mut Rbtree<String>, items: &[String]) {
    for s in items {
        if !tree.remove(s) {
            debug!("Nothing to remove for {s:?}");
        }
    }
}

fn print(rows: Vec<(String, String)>) {
    let (kw, vw) = rows.iter().fold((0, 0), |(kw, vw), (k, v)| {
        (max(kw, UnicodeWidthStr::width(k.as_str())), max(vw, UnicodeWidthStr::width(v.as_str())))
    });

    for (k, v) in rows {
        let padding = " ".repeat(kw - UnicodeWidthStr::width(k.as_str()));
        println!("{k}{padding} | {v:>vw$}");
    }
}
