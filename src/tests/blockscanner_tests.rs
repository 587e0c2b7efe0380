// src/tests/blockscanner_tests.rs

#![allow(non_snake_case)]

use crate::data::commandblock::{BlockKind, FileOpKind, UnitRef};
use crate::data::transcript::Transcript;
use crate::debug::helpers::{create_file_in_dir, create_temp_dir, TempDir};
use crate::readers::blockscanner::{BlockScan, BlockScanner, SOURCE_SCRIPT_ACCEPT};
use crate::tests::common::{
    SCRIPT_MATCHING,
    SCRIPT_UNRELATED,
    SCRIPT_WITH_OPEN,
    TRANSCRIPT_MINI,
    TRANSCRIPT_MISSING_OPEN_ECHO,
    TRANSCRIPT_STREAMED,
    TRANSCRIPT_SYMBOLIC,
    TRANSCRIPT_SYMBOLIC_NO_ECHO,
};

// ─────────────────────────────────────────────────────────────────────────────────────────────────

fn scan_text(text: &str) -> (Transcript, BlockScan) {
    let transcript = Transcript::from_text(text);
    let scan = BlockScanner::new(&transcript).scan();

    (transcript, scan)
}

/// Blocks must partition the transcript: contiguous, in order, no gaps, no
/// overlaps, every line covered.
fn assert_partition(
    transcript: &Transcript,
    scan: &BlockScan,
) {
    assert!(!scan.blocks.is_empty());
    assert_eq!(0, scan.blocks[0].line_beg);
    assert_eq!(BlockKind::Setup, scan.blocks[0].kind);
    for (index, block) in scan.blocks.iter().enumerate() {
        assert_eq!(index, block.index);
        if index > 0 {
            assert_eq!(scan.blocks[index - 1].line_end, block.line_beg);
        }
    }
    assert_eq!(
        transcript.line_count(),
        scan.blocks
            .last()
            .expect("no blocks")
            .line_end
    );
}

// ─────────────────────────────────────────────────────────────────────────────────────────────────

#[test]
fn test_scan_partition_MINI() {
    let (transcript, scan) = scan_text(TRANSCRIPT_MINI);
    assert_partition(&transcript, &scan);
    assert_eq!(2, scan.blocks.len());
    assert_eq!(BlockKind::Setup, scan.blocks[0].kind);
    assert_eq!(BlockKind::Mini, scan.blocks[1].kind);
    // the MINI block begins at its command echo and runs to the end
    assert_eq!(4, scan.blocks[1].line_beg);
    assert_eq!(transcript.line_count(), scan.blocks[1].line_end);
}

#[test]
fn test_scan_partition_empty_transcript() {
    let (transcript, scan) = scan_text("");
    assert_partition(&transcript, &scan);
    assert_eq!(1, scan.blocks.len());
    assert_eq!(0, scan.blocks[0].line_count());
}

#[test]
fn test_scan_is_idempotent() {
    let transcript = Transcript::from_text(TRANSCRIPT_MINI);
    let scanner = BlockScanner::new(&transcript);
    let scan_a = scanner.scan();
    let scan_b = scanner.scan();
    assert_eq!(scan_a.blocks.len(), scan_b.blocks.len());
    for (block_a, block_b) in scan_a.blocks.iter().zip(scan_b.blocks.iter()) {
        assert_eq!(block_a.kind, block_b.kind);
        assert_eq!(block_a.line_beg, block_b.line_beg);
        assert_eq!(block_a.line_end, block_b.line_end);
        assert_eq!(block_a.file_ops, block_b.file_ops);
    }
    assert_eq!(scan_a.commands, scan_b.commands);
}

#[test]
fn test_scan_file_operations() {
    let (_transcript, scan) = scan_text(TRANSCRIPT_MINI);
    // OPEN and READ land in the setup block
    let setup = &scan.blocks[0];
    assert_eq!(2, setup.file_ops.len());
    let open = &setup.file_ops[0];
    assert_eq!(FileOpKind::OpenRead, open.kind);
    assert_eq!(Some(UnitRef::Literal(10)), open.unit);
    assert_eq!(Some(String::from("mol.psf")), open.path);
    let read = &setup.file_ops[1];
    assert_eq!(FileOpKind::Read, read.kind);
    assert_eq!(Some(String::from("PSF")), read.target);
    assert_eq!(Some(UnitRef::Literal(10)), read.unit);
    // the coordinate write after minimization belongs to the MINI block
    let mini = &scan.blocks[1];
    assert_eq!(1, mini.file_ops.len());
    assert_eq!(FileOpKind::Write, mini.file_ops[0].kind);
    assert_eq!(Some(String::from("COOR")), mini.file_ops[0].target);
    assert_eq!(Some(String::from("mini.pdb")), mini.file_ops[0].path);
    // READ PSF UNIT 10 resolves to the opened file
    let found = setup
        .find_open_for_unit(10)
        .expect("no OPEN for unit 10");
    assert_eq!(Some(String::from("mol.psf")), found.path);
}

#[test]
fn test_scan_stream_switch_suppression() {
    let (transcript, scan) = scan_text(TRANSCRIPT_STREAMED);
    assert_partition(&transcript, &scan);
    // the READ echo inside the streamed section is suppressed
    assert_eq!(1, scan.commands_suppressed);
    assert!(scan
        .commands
        .iter()
        .all(|c| !c.text.starts_with("READ")));
    // no file operation was recorded for it
    assert!(scan.blocks[0].file_ops.is_empty());
    // the MINI after the stream returned still opens a block
    assert_eq!(2, scan.blocks.len());
    assert_eq!(BlockKind::Mini, scan.blocks[1].kind);
}

#[test]
fn test_scan_parameter_echoes() {
    let (_transcript, scan) = scan_text(TRANSCRIPT_SYMBOLIC);
    assert_eq!(2, scan.parameters.len());
    assert_eq!("mol.psf", scan.parameters.substitute("@f.psf"));
    // the OPEN with symbolic unit and path resolves through the table
    let open = &scan.blocks[0].file_ops[0];
    assert_eq!(Some(UnitRef::Symbolic(String::from("@1"))), open.unit);
    assert_eq!(
        Some(String::from("mol.psf")),
        open.resolved_path(&scan.parameters)
    );
    assert_eq!(
        UnitRef::Literal(10),
        scan.parameters
            .resolve_unit(open.unit.as_ref().unwrap())
    );
}

#[test]
fn test_scan_unresolved_symbolic_stays_pending() {
    let (_transcript, scan) = scan_text(TRANSCRIPT_SYMBOLIC_NO_ECHO);
    // no Parameter: echoes, no source script: the path stays pending,
    // which is not an error
    let open = &scan.blocks[0].file_ops[0];
    assert_eq!(Some(String::from("@f.psf")), open.path);
    assert_eq!(None, open.resolved_path(&scan.parameters));
}

#[test]
fn test_scan_duplicate_symbolic_OPEN_echoes() {
    let text = "\
 CHARMM>    OPEN READ UNIT @1 CARD NAME @f.psf
 CHARMM>    OPEN READ UNIT @1 CARD NAME @f.psf
 CHARMM>    OPEN READ UNIT 12 CARD NAME other.pdb
";
    let (_transcript, scan) = scan_text(text);
    // the repeated echo carries no new information; the distinct one does
    assert_eq!(2, scan.blocks[0].file_ops.len());
}

// ─────────────────────────────────────────────────────────────────────────────────────────────────
// source-script fallback
// ─────────────────────────────────────────────────────────────────────────────────────────────────

/// Lay out a run directory: the transcript under `log_name` plus sibling
/// files, then scan and resolve.
fn scan_dir(
    tempdir: &TempDir,
    log_name: &str,
    log_text: &str,
    siblings: &[(&str, &[u8])],
) -> BlockScan {
    let log_path = create_file_in_dir(log_text.as_bytes(), log_name, tempdir);
    for (name, data) in siblings.iter() {
        create_file_in_dir(data, name, tempdir);
    }
    let transcript = match Transcript::load(&log_path) {
        Ok(val) => val,
        Err(err) => panic!("Transcript::load({:?}) failed {}", log_path, err),
    };
    let scanner = BlockScanner::new(&transcript);
    let mut scan = scanner.scan();
    match scanner.resolve_source_script(&mut scan) {
        Ok(_) => {}
        Err(err) => panic!("resolve_source_script failed {}", err),
    }

    scan
}

#[test]
fn test_source_script_found() {
    let tempdir = create_temp_dir();
    let scan = scan_dir(
        &tempdir,
        "run.out",
        TRANSCRIPT_SYMBOLIC_NO_ECHO,
        &[
            ("run.inp", SCRIPT_MATCHING.as_bytes()),
            ("other.inp", SCRIPT_UNRELATED.as_bytes()),
        ],
    );
    let script = scan
        .source_script
        .as_ref()
        .expect("source script not found");
    assert!(script.path.ends_with("run.inp"));
    assert!(script.score >= SOURCE_SCRIPT_ACCEPT);
    // the script's `set f mol` resolves the pending path
    assert_eq!(
        Some(String::from("mol.psf")),
        scan.blocks[0].file_ops[0].resolved_path(&scan.parameters)
    );
}

#[test]
fn test_source_script_best_of_several() {
    // five distinct commands are echoed; a 4-of-5 script scores exactly at
    // the acceptance threshold, the full script scores above it
    let partial: &str = "\
set f mol
OPEN READ UNIT 10 CARD NAME @f.psf
READ PSF CARD UNIT 10
MINI SD NSTEP 10 NPRINT 5
ENER
";
    let tempdir = create_temp_dir();
    let scan = scan_dir(
        &tempdir,
        "run.out",
        TRANSCRIPT_SYMBOLIC_NO_ECHO,
        &[
            ("a_partial.inp", partial.as_bytes()),
            ("b_full.inp", SCRIPT_MATCHING.as_bytes()),
        ],
    );
    let script = scan
        .source_script
        .as_ref()
        .expect("source script not found");
    assert!(script.path.ends_with("b_full.inp"));
    assert!(script.score > 0.99);
}

#[test]
fn test_source_script_recovers_unechoed_file_ops() {
    // the transcript never echoed its OPEN; the accepted script carries it
    // literally, continued over two lines
    let tempdir = create_temp_dir();
    let scan = scan_dir(
        &tempdir,
        "run.out",
        TRANSCRIPT_MISSING_OPEN_ECHO,
        &[("run.inp", SCRIPT_WITH_OPEN.as_bytes())],
    );
    assert!(scan.source_script.is_some());
    let setup = &scan.blocks[0];
    let opens = setup.ops_of_kind(FileOpKind::OpenRead);
    assert_eq!(1, opens.len());
    assert_eq!(Some(UnitRef::Literal(10)), opens[0].unit);
    assert_eq!(Some(String::from("mol.psf")), opens[0].path);
    // the READ now resolves against the recovered OPEN
    let found = setup
        .find_open_for_unit(10)
        .expect("no OPEN for unit 10");
    assert_eq!(Some(String::from("mol.psf")), found.path);
}

#[test]
fn test_source_script_none_below_threshold() {
    let tempdir = create_temp_dir();
    let scan = scan_dir(
        &tempdir,
        "run.out",
        TRANSCRIPT_SYMBOLIC_NO_ECHO,
        &[("other.inp", SCRIPT_UNRELATED.as_bytes())],
    );
    assert_eq!(None, scan.source_script);
}

#[test]
fn test_source_script_skips_binary_sibling() {
    let binary: &[u8] = &[0x43, 0x4F, 0x52, 0x44, 0x00, 0x00, 0x01, 0xFF];
    let tempdir = create_temp_dir();
    let scan = scan_dir(
        &tempdir,
        "run.out",
        TRANSCRIPT_SYMBOLIC_NO_ECHO,
        &[
            ("run.dcd", binary),
            ("run.inp", SCRIPT_MATCHING.as_bytes()),
        ],
    );
    let script = scan
        .source_script
        .as_ref()
        .expect("source script not found");
    assert!(script.path.ends_with("run.inp"));
}

#[test]
fn test_source_script_in_memory_transcript_has_no_directory() {
    let (_transcript, mut scan) = scan_text(TRANSCRIPT_SYMBOLIC_NO_ECHO);
    let transcript = Transcript::from_text(TRANSCRIPT_SYMBOLIC_NO_ECHO);
    let scanner = BlockScanner::new(&transcript);
    match scanner.resolve_source_script(&mut scan) {
        Ok(_) => {}
        Err(err) => panic!("resolve_source_script failed {}", err),
    }
    assert_eq!(None, scan.source_script);
}
