use anyhow::{Context, Result, bail};
use mp4::{BoxHeader, BoxType, Mp4Reader};
use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    path::Path,
};

const BOX_HEADER_SIZE: u64 = 8;

/// Reads the top-level box types of an ISO-BMFF file in file order, checking
/// that every declared box size stays within the file.
pub fn top_level_boxes<R: Read + Seek>(reader: &mut R, size: u64) -> Result<Vec<BoxType>> {
    let mut boxes = Vec::new();
    let mut position = reader.seek(SeekFrom::Start(0))?;

    while position < size {
        if size - position < BOX_HEADER_SIZE {
            bail!("{} trailing bytes after last box", size - position);
        }

        let header = BoxHeader::read(reader).context("failed to read box header")?;
        let start = reader.stream_position()? - BOX_HEADER_SIZE;
        boxes.push(header.name);

        // size 0: box runs to the end of the file
        if header.size == 0 {
            break;
        }
        if header.size < BOX_HEADER_SIZE {
            bail!("box {:?} declares invalid size {}", header.name, header.size);
        }

        let next = start + header.size;
        if next > size {
            bail!(
                "box {:?} at offset {} overruns file of {} bytes",
                header.name,
                start,
                size
            );
        }

        position = reader.seek(SeekFrom::Start(next))?;
    }

    Ok(boxes)
}

/// True when the movie metadata comes before the media payload.
pub fn is_fast_start(boxes: &[BoxType]) -> bool {
    let moov = boxes.iter().position(|kind| *kind == BoxType::MoovBox);
    let mdat = boxes.iter().position(|kind| *kind == BoxType::MdatBox);

    match (moov, mdat) {
        (Some(moov), Some(mdat)) => moov < mdat,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Blocking check that `path` is a non-empty, well-formed, fast-start mp4.
pub fn verify_fast_start(path: &Path) -> Result<()> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let size = file.metadata()?.len();
    if size == 0 {
        bail!("output file is empty");
    }

    let boxes = top_level_boxes(&mut BufReader::new(&mut file), size)?;
    if !is_fast_start(&boxes) {
        bail!("moov box does not precede mdat (boxes: {:?})", boxes);
    }

    file.seek(SeekFrom::Start(0))?;
    Mp4Reader::read_header(BufReader::new(file), size).context("not a readable mp4 container")?;

    Ok(())
}
