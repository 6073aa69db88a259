//! Sample FASTQ files for trying out uploads against a test portal.

use rand::Rng;
use std::path::Path;
use tracing::info;

const BASES: &[u8] = b"ACGT";

pub fn generate_sample_fastq_content<R: Rng>(rng: &mut R, num: usize, length: usize) -> String {
    let mut content = String::new();
    for i in 0..num {
        let sequence: String = (0..length)
            .map(|_| BASES[rng.gen_range(0..BASES.len())] as char)
            .collect();
        // Phred+33 qualities between 2 and 41.
        let quality: String = (0..length).map(|_| rng.gen_range(b'#'..=b'J') as char).collect();
        content.push_str(&format!("@SEQUENCE{i} length={length}\n{sequence}\n+\n{quality}\n"));
    }
    content
}

pub fn write_sample_fastq_file(path: &Path, num: usize, length: usize) -> std::io::Result<()> {
    let content = generate_sample_fastq_content(&mut rand::thread_rng(), num, length);
    std::fs::write(path, content)?;
    info!(path = %path.display(), num, length, "Wrote sample FASTQ file");
    Ok(())
}
