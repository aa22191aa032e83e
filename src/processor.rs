use crate::srt::Caption;

use std::convert::TryFrom;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use regex::Regex;

pub struct ProcessOpts {
    pub drop_patterns: Option<PathBuf>,
}

pub fn process(captions: Vec<Caption>, opts: ProcessOpts) -> Result<Vec<Caption>> {
    match opts.drop_patterns {
        Some(path) => {
            let regexes = load_regex(&path)?;
            Ok(drop_matching(captions, &regexes))
        }
        None => Ok(captions),
    }
}

/// Gives each text an equal share of `total_frames`, back to back from frame zero.
///
/// Used when only the overall duration of the captioned media is known.
pub fn spread_evenly(texts: &[String], total_frames: u64) -> Result<Vec<Caption>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    let count = u64::try_from(texts.len())?;
    let per_caption = total_frames / count;
    if per_caption == 0 {
        return Err(anyhow!(
            "Cannot spread {} captions over {} frames.",
            count,
            total_frames
        ));
    }
    log::info!(
        "Spreading {} captions over {} frames ({} frames each)",
        count,
        total_frames,
        per_caption
    );

    let mut start = 0;
    texts
        .iter()
        .map(|text| -> Result<Caption> {
            let end = start + per_caption;
            let caption = Caption::new(text, i64::try_from(start)?, i64::try_from(end)?);
            start = end;
            Ok(caption)
        })
        .collect()
}

fn drop_matching(captions: Vec<Caption>, regexes: &[Regex]) -> Vec<Caption> {
    let before = captions.len();
    let kept: Vec<Caption> = captions
        .into_iter()
        .filter(|caption| !regexes.iter().any(|r| is_match(r, caption)))
        .collect();
    let dropped = before - kept.len();
    if dropped > 0 {
        log::info!("Dropped {} of {} captions", dropped, before);
    }
    kept
}

fn is_match(regex: &Regex, caption: &Caption) -> bool {
    caption.text.iter().any(|line| {
        let mtch = regex.is_match(line);
        if mtch {
            log::debug!("Matched \"{}\" against /{}/", line, regex);
        }
        mtch
    })
}

fn load_regex(path: &Path) -> Result<Vec<Regex>> {
    let patterns = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pattern file: '{}'", path.display()))?;
    parse_patterns(&patterns)
}

fn parse_patterns(patterns: &str) -> Result<Vec<Regex>> {
    let patterns: Vec<&str> = patterns
        .lines()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty() && !p.starts_with('#'))
        .collect();
    log::debug!("Drop patterns: {:?}", patterns);
    patterns
        .into_iter()
        .map(|p| Regex::new(p).with_context(|| format!("Invalid regex: /{}/", p)))
        .collect()
}
