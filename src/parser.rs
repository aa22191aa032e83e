use crate::error::CaptionError;
use crate::srt::Caption;
use crate::timecode::{hmsf_to_frames, FrameRate};

use std::convert::TryFrom;

use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{char, digit1, line_ending, multispace0, space0};
use nom::combinator::{map, map_res, opt, recognize, verify};
use nom::error::{convert_error, ErrorKind, VerboseError};
use nom::multi::{many0, many1, many_till};
use nom::sequence::{pair, terminated};
use nom::{branch::alt, error_position, Err, IResult};

/// Reads caption lists: blocks of an optional index line, a
/// `<position> --> <position>` line and the caption text, separated by a blank line.
///
/// A position is either a frame count or an `HH:MM:SS:FF` frame timecode.
pub struct Parser {
    rate: FrameRate,
}

impl Parser {
    pub fn new(rate: FrameRate) -> Self {
        Self { rate }
    }

    pub fn parse(&self, input: &str) -> Result<Vec<Caption>, CaptionError> {
        let blocks = run(caption_list, input)?;
        blocks
            .into_iter()
            .map(|block| -> Result<Caption, CaptionError> {
                Ok(Caption {
                    sequence_number: block.sequence_number,
                    start_frame: block.start.to_frames(self.rate)?,
                    end_frame: block.end.to_frames(self.rate)?,
                    text: block.text,
                })
            })
            .collect()
    }

    /// Splits plain text into paragraphs, one per caption, keeping their line breaks.
    pub fn parse_paragraphs(&self, input: &str) -> Result<Vec<String>, CaptionError> {
        run(paragraphs, input)
    }

    /// Parses a length of time given as frames or as `HH:MM:SS:FF`.
    pub fn parse_duration(&self, input: &str) -> Result<u64, CaptionError> {
        let frames = run(duration, input)?.to_frames(self.rate)?;
        u64::try_from(frames)
            .map_err(|_| CaptionError::InvalidInput(format!("negative duration '{}'", input)))
    }
}

fn run<'a, O>(
    parser: impl Fn(&'a str) -> IResult<&'a str, O, VerboseError<&'a str>>,
    input: &'a str,
) -> Result<O, CaptionError> {
    match parser(input) {
        Ok((_, out)) => Ok(out),
        Err(Err::Error(err)) | Err(Err::Failure(err)) => {
            Err(CaptionError::ParseError(convert_error(input, err)))
        }
        Err(Err::Incomplete(_)) => {
            unreachable!("Incomplete data received by non-streaming parser.")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Frames(i64),
    Timecode {
        hours: u64,
        minutes: u64,
        seconds: u64,
        frames: u64,
    },
}

impl Position {
    fn to_frames(self, rate: FrameRate) -> Result<i64, CaptionError> {
        match self {
            Position::Frames(frames) => Ok(frames),
            Position::Timecode {
                hours,
                minutes,
                seconds,
                frames,
            } => {
                let total = hmsf_to_frames(hours, minutes, seconds, frames, rate)?;
                i64::try_from(total).map_err(|_| {
                    CaptionError::InvalidInput(format!("timecode of {} frames is too large", total))
                })
            }
        }
    }
}

struct Block {
    sequence_number: Option<usize>,
    start: Position,
    end: Position,
    text: Vec<String>,
}

fn optional_bom(input: &str) -> IResult<&str, Option<&str>, VerboseError<&str>> {
    opt(tag("\u{FEFF}"))(input)
}

fn end_of_file(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    if input.is_empty() {
        Ok((input, input))
    } else {
        std::result::Result::Err(Err::Error(error_position!(input, ErrorKind::Eof)))
    }
}

fn caption_list(input: &str) -> IResult<&str, Vec<Block>, VerboseError<&str>> {
    let (input, _) = optional_bom(input)?;
    let (mut input, _) = multispace0(input)?;
    let mut blocks = Vec::new();
    // Blocks stay in file order; the writer relies on it.
    while !input.is_empty() {
        let (rem_input, block) = block(input)?;
        blocks.push(block);
        let (rem_input, _) = multispace0(rem_input)?;
        input = rem_input;
    }
    Ok((input, blocks))
}

fn block(input: &str) -> IResult<&str, Block, VerboseError<&str>> {
    let (input, sequence_number) = opt(terminated(seq_num, pair(space0, line_ending)))(input)?;
    let (input, (start, end)) = terminated(span, alt((line_ending, end_of_file)))(input)?;
    let (input, text) = sub_text(input)?;

    Ok((
        input,
        Block {
            sequence_number,
            start,
            end,
            text,
        },
    ))
}

fn sub_text(input: &str) -> IResult<&str, Vec<String>, VerboseError<&str>> {
    // A whitespace-only line ends the block just like an empty one.
    let end_of_block = alt((blank_line, recognize(pair(space0, end_of_file))));
    let (input, (vec, _)) = many_till(text_line, end_of_block)(input)?;

    Ok((input, vec.into_iter().map(String::from).collect()))
}

fn span(input: &str) -> IResult<&str, (Position, Position), VerboseError<&str>> {
    let (input, start) = position(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = tag("-->")(input)?;
    let (input, _) = space0(input)?;
    let (input, end) = position(input)?;
    let (input, _) = space0(input)?;

    Ok((input, (start, end)))
}

fn position(input: &str) -> IResult<&str, Position, VerboseError<&str>> {
    alt((frame_timecode, frame_count))(input)
}

fn frame_timecode(input: &str) -> IResult<&str, Position, VerboseError<&str>> {
    let (input, hours) = number(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, minutes) = number(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, seconds) = number(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, frames) = number(input)?;

    Ok((
        input,
        Position::Timecode {
            hours,
            minutes,
            seconds,
            frames,
        },
    ))
}

fn frame_count(input: &str) -> IResult<&str, Position, VerboseError<&str>> {
    // The sign is accepted here so that negative positions are reported as
    // invalid input rather than as a syntax error.
    map(
        map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| {
            s.parse::<i64>()
        }),
        Position::Frames,
    )(input)
}

fn number(input: &str) -> IResult<&str, u64, VerboseError<&str>> {
    map_res(digit1, |s: &str| s.parse())(input)
}

fn seq_num(input: &str) -> IResult<&str, usize, VerboseError<&str>> {
    map_res(digit1, |s: &str| s.parse())(input)
}

fn duration(input: &str) -> IResult<&str, Position, VerboseError<&str>> {
    let (input, _) = space0(input)?;
    let (input, position) = position(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = end_of_file(input)?;
    Ok((input, position))
}

fn paragraphs(input: &str) -> IResult<&str, Vec<String>, VerboseError<&str>> {
    let (input, _) = optional_bom(input)?;
    let (input, paras) = many0(paragraph)(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = end_of_file(input)?;
    Ok((input, paras))
}

fn paragraph(input: &str) -> IResult<&str, String, VerboseError<&str>> {
    let (input, _) = many0(blank_line)(input)?;
    let (input, lines) = many1(text_line)(input)?;
    Ok((input, lines.join("\n")))
}

fn blank_line(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    recognize(pair(space0, line_ending))(input)
}

fn text_line(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    terminated(
        verify(
            take_while1(|c: char| c != '\n' && c != '\r'),
            |s: &str| !s.trim().is_empty(),
        ),
        alt((line_ending, end_of_file)),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> Parser {
        Parser::new(FrameRate::default())
    }

    macro_rules! test_position {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected) = $value;

                let (_, pos) = position(input).unwrap();

                assert_eq!(pos.to_frames(FrameRate::default()).unwrap(), expected);
            }
        )*
        }
    }

    test_position! {
        test_position_0: ("0", 0),
        test_position_1: ("48", 48),
        test_position_2: ("-3", -3),
        test_position_3: ("00:00:01:12", 36),
        test_position_4: ("01:00:00:00", 86_400),
        test_position_5: ("1:2:3:4", 89_356),
    }

    #[test]
    fn parses_blocks_in_file_order() {
        let input = "\u{FEFF}7\n48 --> 72\nsecond\n\n3\n0 --> 24\nfirst\nline two\n";
        let captions = parser().parse(input).unwrap();

        assert_eq!(captions.len(), 2);
        assert_eq!(captions[0].sequence_number, Some(7));
        assert_eq!((captions[0].start_frame, captions[0].end_frame), (48, 72));
        assert_eq!(captions[0].text, vec!["second"]);
        assert_eq!(captions[1].sequence_number, Some(3));
        assert_eq!(captions[1].text, vec!["first", "line two"]);
    }

    #[test]
    fn sequence_number_is_optional() {
        let input = "0 --> 24\nHello\n\n00:00:01:00-->00:00:02:00\r\nWorld\r\n";
        let captions = parser().parse(input).unwrap();

        assert_eq!(captions[0].sequence_number, None);
        assert_eq!(captions[1].sequence_number, None);
        assert_eq!((captions[1].start_frame, captions[1].end_frame), (24, 48));
        assert_eq!(captions[1].text, vec!["World"]);
    }

    #[test]
    fn block_without_text_yields_blank_caption() {
        let input = "1\n0 --> 24\n\n2\n24 --> 48\nkept\n\n";
        let captions = parser().parse(input).unwrap();

        assert_eq!(captions.len(), 2);
        assert!(captions[0].is_blank());
        assert_eq!(captions[1].text, vec!["kept"]);
    }

    #[test]
    fn whitespace_only_separator_ends_block() {
        let input = "1\n0 --> 24\nHello\n  \n2\n24 --> 48\nWorld\n";
        let captions = parser().parse(input).unwrap();

        assert_eq!(captions.len(), 2);
        assert_eq!(captions[0].text, vec!["Hello"]);
        assert_eq!(captions[1].sequence_number, Some(2));
        assert_eq!((captions[1].start_frame, captions[1].end_frame), (24, 48));
        assert_eq!(captions[1].text, vec!["World"]);
    }

    #[test]
    fn whitespace_only_crlf_separator_ends_block() {
        let input = "1\r\n0 --> 24\r\nHello\r\n\t \r\n2\r\n24 --> 48\r\nWorld\r\n";
        let captions = parser().parse(input).unwrap();

        assert_eq!(captions.len(), 2);
        assert_eq!(captions[0].text, vec!["Hello"]);
        assert_eq!(captions[1].text, vec!["World"]);
    }

    #[test]
    fn trailing_spaces_at_end_of_input_end_block() {
        let captions = parser().parse("0 --> 24\nHello\n   ").unwrap();
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].text, vec!["Hello"]);
    }

    #[test]
    fn indented_text_is_kept() {
        let captions = parser().parse("0 --> 24\n  indented\n").unwrap();
        assert_eq!(captions[0].text, vec!["  indented"]);
    }

    #[test]
    fn negative_positions_are_parsed_for_validation() {
        let captions = parser().parse("-5 --> 10\ntext\n").unwrap();
        assert_eq!(captions[0].start_frame, -5);
    }

    #[test]
    fn out_of_range_frame_field_is_invalid_input() {
        match parser().parse("00:00:00:30 --> 00:00:01:00\ntext\n") {
            Err(CaptionError::InvalidInput(_)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn malformed_timing_is_a_parse_error() {
        match parser().parse("1\n00:00:01,000 --> 00:00:02,000\ntext\n") {
            Err(CaptionError::ParseError(_)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn empty_input_has_no_captions() {
        assert!(parser().parse("").unwrap().is_empty());
        assert!(parser().parse("\n\n  \n").unwrap().is_empty());
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let input = "\n\nHello there\nGeneral\n   \nSecond one\n\n\nThird\n  ";
        let paras = parser().parse_paragraphs(input).unwrap();

        assert_eq!(paras, vec!["Hello there\nGeneral", "Second one", "Third"]);
    }

    #[test]
    fn durations() {
        assert_eq!(parser().parse_duration("240").unwrap(), 240);
        assert_eq!(parser().parse_duration(" 00:01:00:00\n").unwrap(), 1440);
        assert!(parser().parse_duration("-24").is_err());
        assert!(parser().parse_duration("ten seconds").is_err());
    }
}
