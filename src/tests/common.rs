// src/tests/common.rs

//! Fixture transcripts shared among the tests.
//!
//! The fixtures follow the layout of genuine CHARMM run logs: commands
//! echoed on `CHARMM>` prompt lines, minimization and dynamics tables with
//! multi-token tag columns, Fortran-formatted numbers.

#![allow(non_upper_case_globals)]

/// A small complete minimization run: setup reads, one `MINI` command with
/// `NSTEP 10 NPRINT 5`, cycle/intern/extern tables, convergence notice, a
/// coordinate write afterwards.
pub const TRANSCRIPT_MINI: &str = "\
1
                 Chemistry at HARvard Macromolecular Mechanics
 CHARMM>    OPEN READ UNIT 10 CARD NAME mol.psf
 CHARMM>    READ PSF CARD UNIT 10
 CHARMM>    MINI SD NSTEP 10 NPRINT 5 TOLGRD 0.00100
STEEPD> An energy minimization has been requested.
MINI MIN: Cycle      ENERgy      Delta-E         GRMS    Step-size
MINI INTERN:          BONDs       ANGLes       UREY-b    DIHEdrals    IMPRopers
MINI EXTERN:        VDWaals         ELEC       HBONds          ASP         USER
 ----------       ---------    ---------    ---------    ---------    ---------
MINI>        0     86.50920      0.00000     14.99755      0.02000
MINI INTERN>        4.77161     12.74742      0.00000     31.46273      2.83710
MINI EXTERN>       13.22145     21.26960      0.00000      0.00000      0.00000
 ----------       ---------    ---------    ---------    ---------    ---------
MINI>        5     42.05631    -44.45289      5.47412      0.01538
MINI>       10     30.20401    -11.85230      2.96294      0.01007
 > Minimization exiting with gradient tolerance ( 0.00100) satisfied.
 CHARMM>    WRIT COOR PDB UNIT 20 NAME mini.pdb
";

/// Dynamics with `NSTEP 20 NPRINT 10 NSAVC 10`; the `DYNA>` row at step `5`
/// is off the log schedule and must be suppressed. The command echo is
/// continued over two prompt lines, and CHARMM repeats the parameters in a
/// `NSTEP  =` summary line.
pub const TRANSCRIPT_DYNA: &str = "\
 CHARMM>    DYNA LEAP VERL STRT NSTEP 20 TIMESTEP 0.001 -
 CHARMM>    NPRINT 10 NSAVC 10 IUNCRD -1
 NSTEP  =       20   NPRINT =       10
DYNA DYN: Step         Time      TOTEner        TOTKe       ENERgy  TEMPerature
DYNA PROP:             GRMS      HFCTote        HFCKe       EHFCor        VIRKe
 ----------       ---------    ---------    ---------    ---------    ---------
DYNA>        0      0.00000     45.00000     15.00000     30.00000    300.00000
DYNA PROP>        2.00000     45.00000     15.00000      0.00000     10.00000
DYNA>        5      0.00500     44.90000     14.95000     29.95000    299.00000
DYNA>       10      0.01000     44.80000     14.90000     29.90000    298.00000
DYNA PROP>        1.90000     44.80000     14.90000      0.00000      9.50000
DYNA>       20      0.02000     44.60000     14.80000     29.80000    296.00000
";

/// A single-point energy evaluation. No step schedule applies; the `Eval#`
/// column feeds the running step counter.
pub const TRANSCRIPT_ENER: &str = "\
 CHARMM>    ENER
ENER ENR:  Eval#     ENERgy      Delta-E         GRMS
ENER INTERN:          BONDs       ANGLes       UREY-b    DIHEdrals    IMPRopers
 ----------       ---------    ---------    ---------
ENER>        1     30.20401      0.00000      2.96294
ENER INTERN>        1.77161      8.74742      0.00000     29.46273      2.83710
 ----------       ---------    ---------    ---------
";

/// A minimization whose energy column overflowed Fortran's field width;
/// the `********` token must become a `Null` value without harming its
/// siblings.
pub const TRANSCRIPT_MINI_MALFORMED: &str = "\
 CHARMM>    MINI ABNR NSTEP 4 NPRINT 2
MINI MIN: Cycle      ENERgy      Delta-E         GRMS    Step-size
 ----------       ---------    ---------    ---------    ---------
MINI>        2     ********      0.50000      4.00000      0.02000
";

/// Commands replayed from a streamed sub-script; the bracketed `READ` echo
/// must be suppressed, not recorded as a command or file operation.
pub const TRANSCRIPT_STREAMED: &str = "\
 CHARMM>    STREAM seq.str
 MAIN> INPUT STREAM SWITCHING TO UNIT    99
 CHARMM>    READ SEQU CARD UNIT 21
 VCLOSE: RETURNING TO INPUT STREAM
 CHARMM>    MINI SD NSTEP 2
";

/// A run referencing files through `@` substitution parameters, with the
/// `Parameter:` echoes CHARMM prints when it substitutes them.
pub const TRANSCRIPT_SYMBOLIC: &str = "\
 CHARMM>    OPEN READ UNIT @1 CARD NAME @f.psf
 Parameter: 1 <- \"10\"
 Parameter: F <- \"mol\"
 CHARMM>    READ PSF CARD UNIT @1
 CHARMM>    MINI SD NSTEP 10 NPRINT 5
 CHARMM>    ENER
 CHARMM>    STOP
";

/// A minimization echoing `NSTEP` but no `NPRINT`; the minimizer prints at
/// cycles of its own choosing and the rows must not be schedule-gated.
pub const TRANSCRIPT_MINI_NO_NPRINT: &str = "\
 CHARMM>    MINI SD NSTEP 10
MINI MIN: Cycle      ENERgy      Delta-E         GRMS
 ----------       ---------    ---------    ---------
MINI>        1     50.00000     -1.00000      3.00000
 > Minimization exiting with gradient tolerance ( 0.00100) satisfied.
";

/// A run whose `Parameter:` echoes are missing (pruned or redirected
/// output); only a located source script can resolve `@f`.
pub const TRANSCRIPT_SYMBOLIC_NO_ECHO: &str = "\
 CHARMM>    OPEN READ UNIT 10 CARD NAME @f.psf
 CHARMM>    READ PSF CARD UNIT 10
 CHARMM>    MINI SD NSTEP 10 NPRINT 5
 CHARMM>    ENER
 CHARMM>    STOP
";

/// The command script matching [`TRANSCRIPT_SYMBOLIC_NO_ECHO`] in full
/// (score 1.0), declaring `@f` with a `set` statement.
pub const SCRIPT_MATCHING: &str = "\
* minimization input
*
set f mol
OPEN READ UNIT 10 CARD NAME @f.psf
READ PSF CARD UNIT 10
MINI SD NSTEP 10 NPRINT 5
ENER
STOP
";

/// A transcript whose `OPEN` echo was lost to redirected output; only a
/// located source script carries the literal `OPEN` command.
pub const TRANSCRIPT_MISSING_OPEN_ECHO: &str = "\
 CHARMM>    READ PSF CARD UNIT 10
 CHARMM>    MINI SD NSTEP 10 NPRINT 5
 CHARMM>    STOP
";

/// The command script matching [`TRANSCRIPT_MISSING_OPEN_ECHO`] in full,
/// with the unechoed `OPEN` continued over two lines.
pub const SCRIPT_WITH_OPEN: &str = "\
* minimization input
*
OPEN READ UNIT 10 CARD -
  NAME mol.psf
READ PSF CARD UNIT 10
MINI SD NSTEP 10 NPRINT 5
STOP
";

/// A script sharing only two of the five echoed commands (score 0.4);
/// must never be accepted.
pub const SCRIPT_UNRELATED: &str = "\
* different run
*
ENER
STOP
";
