use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use academy_roster::backend::Authenticator;
use academy_roster::backend::memory::seed_age_groups;
use academy_roster::backend::sqlite;
use academy_roster::config::Config;
use academy_roster::model::AGE_GROUPS;

fn main() -> Result<()> {
    let db_path = match parse_arg("db") {
        Some(path) => PathBuf::from(path),
        None => Config::load()?.db_path,
    };

    let (mut auth, mut store) = sqlite::open(&db_path)
        .with_context(|| format!("opening {}", db_path.display()))?;

    let groups = seed_age_groups();
    for (idx, group) in groups.iter().enumerate() {
        let id = format!("ag{}", idx + 1);
        store
            .put(AGE_GROUPS, &id, &group.to_record())
            .with_context(|| format!("writing {AGE_GROUPS}/{id}"))?;
    }

    println!("Academy seed complete");
    println!("DB: {}", db_path.display());
    println!("Age groups: {}", groups.len());

    if let Some(account) = parse_arg("account") {
        let (email, password) = account
            .split_once(':')
            .ok_or_else(|| anyhow!("--account expects EMAIL:PASSWORD"))?;
        auth.sign_up(email, password)
            .map_err(|err| anyhow!("creating account {email}: {err}"))?;
        println!("Account: {email}");
    }
    Ok(())
}

/// Accepts `--name=value` or `--name value`.
fn parse_arg(name: &str) -> Option<String> {
    let flag = format!("--{name}");
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&format!("{flag}=")) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if *arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
