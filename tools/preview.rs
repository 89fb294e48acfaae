/// Preview — walks a seed through every stage and prints the outline.
///
/// Usage: preview [--seed <n>] [--tone <light|hard|bleak>] [--set <group>=<key>]...
///                [--motifs <a,b,c>] [--random <scope>] [--candidate <0|1>]
///                [--policy <path>] [--catalog <path>] [--block <n>] [--preset <name>]
///
/// Build with `--features preview`. Set RUST_LOG=story_outline=debug to see
/// generation and gate traces.

use std::process;

use story_outline::core::audit::MemoryAuditLog;
use story_outline::core::pipeline::{ActionOutcome, StoryEngine};
use story_outline::schema::blocks::{BlocksDraft, ExpandPreset};
use story_outline::schema::idea::{IdeaForm, RandomizeScope, Tone};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

struct Args {
    seed: u32,
    tone: Tone,
    selections: Vec<(String, String)>,
    motifs: Vec<String>,
    random: Option<RandomizeScope>,
    candidate: usize,
    policy: Option<String>,
    catalog: Option<String>,
    block: Option<u8>,
    preset: Option<ExpandPreset>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();

    let audit = Arc::new(MemoryAuditLog::default());
    let mut builder = StoryEngine::builder().audit_sink(audit.clone());
    if let Some(ref path) = args.policy {
        builder = builder.policy_file(path);
    }
    if let Some(ref path) = args.catalog {
        builder = builder.catalog_file(path);
    }
    let mut engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => fail(&format!("failed to build engine: {}", e)),
    };

    let mut form = IdeaForm::new(args.tone).with_seed(args.seed);
    for (group, key) in &args.selections {
        form = form.select(group, key);
    }
    form.motifs_ranked = args.motifs.clone();
    if let Some(scope) = args.random {
        form = engine.randomize_form(&form, scope);
        println!("Randomized form ({:?}):", scope);
        for (group, key) in &form.selections {
            println!("  {} = {}", group, key);
        }
        if !form.motifs_ranked.is_empty() {
            println!("  motifs = {}", form.motifs_ranked.join(", "));
        }
        println!();
    }

    let idea = match engine.generate_idea(&form, &form.compact(), None) {
        Ok(idea) => idea,
        Err(e) => fail(&format!("idea generation failed: {}", e)),
    };
    println!("=== Idea (seed {}, tone {}) ===\n", idea.state.seed, idea.state.tone.as_str());
    for (i, candidate) in idea.candidates.iter().enumerate() {
        println!("[{}] {}", i, candidate.logline);
        println!("    {}", candidate.synopsis);
        println!("    tags: {}\n", candidate.tags.join(", "));
    }

    let chosen = &idea.candidates[args.candidate.min(1)];
    let acts = match engine.generate_acts(&chosen.logline, &chosen.synopsis, &idea.state) {
        Ok(acts) => acts,
        Err(e) => fail(&format!("acts generation failed: {}", e)),
    };
    println!("=== Acts (candidate {}) ===\n", args.candidate.min(1));
    for act in &acts.acts {
        println!("{}", act.title);
        println!("  {}\n", act.summary);
    }

    let mut draft = match engine.generate_blocks_overview(chosen, &idea.state, Some(&acts)) {
        Ok(draft) => draft,
        Err(e) => fail(&format!("blocks generation failed: {}", e)),
    };
    println!("=== Blocks ===\n");
    print_blocks(&draft);

    if let Some(index) = args.block {
        println!("\n=== Block {} ===\n", index);
        let outcome = match args.preset {
            Some(preset) => engine.expand_detail(&mut draft, &idea.state, index, preset),
            None => engine.generate_detail(&mut draft, &idea.state, index),
        };
        match outcome {
            Ok(ActionOutcome::Applied(_)) => {
                if let Some(detail) = draft.node(index).and_then(|n| n.selected_detail()) {
                    println!("{}", detail.beat);
                    if let Some(ref hooks) = detail.micro_hooks {
                        for hook in hooks {
                            println!("  > {}", hook);
                        }
                    }
                }
            }
            Ok(ActionOutcome::Blocked(reason)) => println!("Blocked: {:?}", reason),
            Err(e) => fail(&format!("detail generation failed: {}", e)),
        }
    }

    println!("\n--- {} generation calls recorded ---", audit.len());
    for record in audit.snapshot() {
        println!(
            "  {:<20} {:<5} ok={} chars={}",
            record.stage.as_str(),
            record.mode.as_str(),
            record.ok,
            record.response_chars
        );
    }
}

fn print_blocks(draft: &BlocksDraft) {
    for (index, node) in &draft.blocks_by_index {
        if let Some(overview) = node.selected_overview() {
            println!("{:>2}. {}", index, overview.headline);
            for hook in &overview.hooks {
                println!("      - {}", hook);
            }
        }
    }
    if let Some(ref b_story) = draft.memory.b_story {
        println!("\nB-story: {}", b_story);
    }
}

fn parse_args() -> Args {
    let raw: Vec<String> = std::env::args().collect();
    let mut args = Args {
        seed: 42,
        tone: Tone::Light,
        selections: Vec::new(),
        motifs: Vec::new(),
        random: None,
        candidate: 0,
        policy: None,
        catalog: None,
        block: None,
        preset: None,
    };

    let mut i = 1;
    while i < raw.len() {
        match raw[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--seed" if i + 1 < raw.len() => {
                i += 1;
                args.seed = raw[i].parse().unwrap_or(42);
            }
            "--tone" if i + 1 < raw.len() => {
                i += 1;
                args.tone = match raw[i].as_str() {
                    "light" => Tone::Light,
                    "hard" => Tone::Hard,
                    "bleak" => Tone::Bleak,
                    other => fail(&format!("Unknown tone: {}", other)),
                };
            }
            "--set" if i + 1 < raw.len() => {
                i += 1;
                match raw[i].split_once('=') {
                    Some((group, key)) => args.selections.push((group.to_string(), key.to_string())),
                    None => fail(&format!("Expected <group>=<key>, got: {}", raw[i])),
                }
            }
            "--motifs" if i + 1 < raw.len() => {
                i += 1;
                args.motifs = raw[i]
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            "--random" if i + 1 < raw.len() => {
                i += 1;
                args.random = Some(match raw[i].as_str() {
                    "all" => RandomizeScope::All,
                    "world" => RandomizeScope::World,
                    "character" => RandomizeScope::Character,
                    "plot" => RandomizeScope::Plot,
                    "motifs" => RandomizeScope::Motifs,
                    other => fail(&format!("Unknown scope: {}", other)),
                });
            }
            "--candidate" if i + 1 < raw.len() => {
                i += 1;
                args.candidate = raw[i].parse().unwrap_or(0);
            }
            "--policy" if i + 1 < raw.len() => {
                i += 1;
                args.policy = Some(raw[i].clone());
            }
            "--catalog" if i + 1 < raw.len() => {
                i += 1;
                args.catalog = Some(raw[i].clone());
            }
            "--block" if i + 1 < raw.len() => {
                i += 1;
                match raw[i].parse() {
                    Ok(n) => args.block = Some(n),
                    Err(_) => fail(&format!("Invalid block index: {}", raw[i])),
                }
            }
            "--preset" if i + 1 < raw.len() => {
                i += 1;
                match ExpandPreset::parse(&raw[i]) {
                    Some(p) => args.preset = Some(p),
                    None => fail(&format!("Unknown preset: {}", raw[i])),
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", raw[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }
    args
}

fn fail(message: &str) -> ! {
    eprintln!("ERROR: {}", message);
    process::exit(1);
}

fn print_usage() {
    eprintln!("Usage: preview [options]");
    eprintln!();
    eprintln!("  --seed <n>              seed for every stage (default 42)");
    eprintln!("  --tone <t>              light, hard or bleak");
    eprintln!("  --set <group>=<key>     select an option, e.g. world_setting=scifi");
    eprintln!("  --motifs <a,b,c>        ranked motif keys");
    eprintln!("  --random <scope>        fill all/world/character/plot/motifs from the seed");
    eprintln!("  --candidate <0|1>       which idea to develop");
    eprintln!("  --policy <path>         RON session policy");
    eprintln!("  --catalog <path>        RON option catalog");
    eprintln!("  --block <n>             generate a detail for block n");
    eprintln!("  --preset <name>         expand the detail with a preset");
}
