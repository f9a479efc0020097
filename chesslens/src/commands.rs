//! Subcommand handlers. Each returns the text to print so it can be tested
//! without a terminal.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context};
use chess::{CozyRules, Move, Position, ResultSet, Rules};
use detection::{classifications_to_detection, Classification, DetectionResult, Orientation};
use session::{AnalysisSession, SessionConfig, SessionState};

pub struct AnalyzeOptions {
    pub fen: Option<String>,
    pub depth: Option<u32>,
    pub multipv: Option<u32>,
    pub engine: Option<std::path::PathBuf>,
    pub json: bool,
}

pub async fn analyze(options: AnalyzeOptions) -> anyhow::Result<String> {
    let position = parse_position(options.fen.as_deref())?;

    let mut config = SessionConfig::from_env();
    if let Some(depth) = options.depth {
        config.depth = depth.max(1);
    }
    if let Some(multipv) = options.multipv {
        config.engine = config.engine.with_multipv(multipv);
    }
    if let Some(path) = options.engine {
        config.engine.path = Some(path);
    }

    let mut session = AnalysisSession::new(position.clone(), config);
    session.start_engine().await.context("could not start engine")?;

    let outcome = run_analysis(&mut session).await;
    session.shutdown().await?;
    let results = outcome?;

    if options.json {
        return Ok(serde_json::to_string_pretty(&results)?);
    }
    Ok(format_results(&position, &results, &CozyRules))
}

async fn run_analysis(session: &mut AnalysisSession) -> anyhow::Result<ResultSet> {
    let mut ticket = session.start_analysis().await?;
    let mut reported = 0;
    while let Some(progress) = ticket.pending.next_progress().await {
        if progress.depth() > reported {
            reported = progress.depth();
            if let Some(top) = progress.top() {
                tracing::info!(depth = reported, score = %top.score.display(), "Searching");
            }
        }
    }
    Ok(session.finish_analysis(ticket).await?)
}

pub fn format_results(position: &Position, results: &ResultSet, rules: &dyn Rules) -> String {
    let mut out = String::new();
    for line in results.lines() {
        let first = line
            .best_move()
            .and_then(|uci| uci.parse::<Move>().ok())
            .and_then(|mv| rules.to_san(position, mv).ok())
            .unwrap_or_else(|| "?".to_string());
        let _ = writeln!(
            out,
            "{}. {:<7} {:>7}  depth {:<3} {}",
            line.rank,
            first,
            line.score.display(),
            line.depth,
            line.pv.join(" ")
        );
    }
    match &results.best_move {
        Some(best) => {
            let _ = writeln!(out, "bestmove {best}");
        }
        None => out.push_str("bestmove (none)\n"),
    }
    out
}

/// Report placement defects and advisory problems of a literal. Fails when
/// the literal cannot be read or is not playable.
pub fn validate(fen: &str) -> anyhow::Result<String> {
    let position = Position::parse_unvalidated(fen)?;
    let audit = position.audit();
    let mut out = format!("{}\n", position.to_fen());
    if audit.is_empty() {
        out.push_str("valid\n");
        return Ok(out);
    }
    for problem in &audit {
        let _ = writeln!(out, "- {problem}");
    }
    if !position.is_valid() {
        bail!("{}invalid position", out);
    }
    Ok(out)
}

pub struct DetectOptions {
    pub classifications: bool,
    pub flipped: bool,
    pub accept: bool,
    pub override_review: bool,
}

/// Load a detection response (or raw classifier output) from JSON and run it
/// through the review gate.
pub fn detect(path: &Path, options: &DetectOptions) -> anyhow::Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;

    let result = if options.classifications {
        let classifications: Vec<Classification> = serde_json::from_str(&text)?;
        let orientation = if options.flipped {
            Orientation::Flipped
        } else {
            Orientation::Standard
        };
        classifications_to_detection(&classifications, orientation)?
    } else {
        DetectionResult::from_json(&text)?
    };

    let mut session = AnalysisSession::new(Position::starting(), SessionConfig::from_env());
    let bridge = session.load_detection(result)?;

    let mut out = String::new();
    let _ = writeln!(out, "fen: {}", bridge.pending());
    let _ = writeln!(
        out,
        "confidence: {:.2} (threshold {:.2})",
        bridge.confidence(),
        bridge.threshold()
    );
    let doubtful: Vec<String> = bridge
        .low_confidence_squares()
        .iter()
        .map(|sq| sq.to_string())
        .collect();
    if !doubtful.is_empty() {
        let _ = writeln!(out, "review squares: {}", doubtful.join(" "));
    }
    for problem in bridge.validation_errors() {
        let _ = writeln!(out, "- {problem}");
    }

    if options.accept || options.override_review {
        let accepted = session.accept_detection(options.override_review)?;
        let _ = writeln!(out, "accepted: {accepted}");
    }
    Ok(out)
}

/// Apply moves (algebraic or coordinate) from a position and print the
/// resulting history.
pub fn play(fen: Option<&str>, moves: &[String], json: bool) -> anyhow::Result<String> {
    let mut state = SessionState::new(parse_position(fen)?);
    state.start_playing()?;

    for text in moves {
        let coordinate = text
            .parse::<Move>()
            .ok()
            .filter(|mv| state.rules().is_legal(state.position(), *mv));
        match coordinate {
            Some(mv) => state.apply_move(mv),
            None => state.apply_san(text),
        }
        .with_context(|| format!("cannot play '{text}'"))?;
    }

    let snapshot = state.snapshot();
    if json {
        return Ok(snapshot.to_json()?);
    }

    let mut out = String::new();
    let origin = state
        .history()
        .map(|h| h.origin().side_to_move)
        .unwrap_or(chess::PieceColor::White);
    let number = state.history().map_or(1, |h| h.origin().fullmove_number);
    for (i, record) in snapshot.history.iter().enumerate() {
        // Ply index counted from White's first move of the origin's move number.
        let ply = i + usize::from(origin == chess::PieceColor::Black);
        if ply % 2 == 0 {
            let _ = write!(out, "{}. {} ", number as usize + ply / 2, record.san);
        } else if i == 0 {
            let _ = write!(out, "{}... {} ", number, record.san);
        } else {
            let _ = write!(out, "{} ", record.san);
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", snapshot.fen);
    Ok(out)
}

fn parse_position(fen: Option<&str>) -> anyhow::Result<Position> {
    match fen {
        Some(text) => Ok(text.parse()?),
        None => Ok(Position::starting()),
    }
}
