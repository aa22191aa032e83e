use crate::error::CaptionError;
use crate::srt::Caption;
use crate::timecode::{frames_to_timecode, FrameRate};

use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes `captions` as an SRT file at `output`, replacing any existing file.
///
/// All captions are checked before the file is opened, so invalid input never
/// leaves a partial file behind. The parent directory must already exist.
/// Returns the number of blocks written.
pub fn serialise<P: AsRef<Path>>(
    captions: &[Caption],
    output: P,
    rate: FrameRate,
) -> Result<usize, CaptionError> {
    validate(captions)?;
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    let written = write_blocks(&mut writer, captions, rate)?;
    writer.flush()?;
    Ok(written)
}

/// Same as [`serialise`], but to an arbitrary writer such as stdout.
pub fn write_captions<W: Write>(
    buf: &mut W,
    captions: &[Caption],
    rate: FrameRate,
) -> Result<usize, CaptionError> {
    validate(captions)?;
    let written = write_blocks(buf, captions, rate)?;
    buf.flush()?;
    Ok(written)
}

fn validate(captions: &[Caption]) -> Result<(), CaptionError> {
    for (index, caption) in captions.iter().enumerate() {
        span(index, caption)?;
    }
    Ok(())
}

fn span(index: usize, caption: &Caption) -> Result<(u64, u64), CaptionError> {
    let describe = || match caption.sequence_number {
        Some(seq) => format!("caption {} (numbered {})", index + 1, seq),
        None => format!("caption {}", index + 1),
    };
    let start = u64::try_from(caption.start_frame).map_err(|_| {
        CaptionError::InvalidInput(format!(
            "{} starts at negative frame {}",
            describe(),
            caption.start_frame
        ))
    })?;
    let end = u64::try_from(caption.end_frame).map_err(|_| {
        CaptionError::InvalidInput(format!(
            "{} ends at negative frame {}",
            describe(),
            caption.end_frame
        ))
    })?;
    if end < start {
        return Err(CaptionError::InvalidInput(format!(
            "{} ends (frame {}) before it starts (frame {})",
            describe(),
            end,
            start
        )));
    }
    Ok((start, end))
}

fn write_blocks<W: Write>(
    buf: &mut W,
    captions: &[Caption],
    rate: FrameRate,
) -> Result<usize, CaptionError> {
    let mut seqnum = 0;
    for (index, caption) in captions.iter().enumerate() {
        if caption.is_blank() {
            log::debug!("Skipping blank caption {}", index + 1);
            continue;
        }
        seqnum += 1;
        let (start, end) = span(index, caption)?;
        write_block(buf, seqnum, start, end, &caption.text, rate)?;
    }
    Ok(seqnum)
}

fn write_block<W: Write>(
    buf: &mut W,
    seqnum: usize,
    start: u64,
    end: u64,
    text: &[String],
    rate: FrameRate,
) -> Result<(), CaptionError> {
    writeln!(buf, "{}", seqnum)?;
    writeln!(
        buf,
        "{} --> {}",
        frames_to_timecode(start, rate),
        frames_to_timecode(end, rate)
    )?;
    for line in text {
        // A blank line would end the block early.
        if line.trim().is_empty() {
            log::debug!("Dropping blank line inside subtitle {}", seqnum);
            continue;
        }
        writeln!(buf, "{}", line)?;
    }
    writeln!(buf)?;
    Ok(())
}
