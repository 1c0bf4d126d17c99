use crate::cli::CheckKind;
use qa_edgematch::{
    BorderingLines, BorderingPoints, CrossingAreas, CrossingLines, EdgeMatchStrategy, IssueCodes,
};

pub fn run(check: CheckKind) {
    let codes = match check {
        CheckKind::BorderingLines => BorderingLines.issue_codes(),
        CheckKind::CrossingAreas => CrossingAreas.issue_codes(),
        CheckKind::BorderingPoints => BorderingPoints.issue_codes(),
        CheckKind::CrossingLines => CrossingLines.issue_codes(),
    };
    print_codes(&codes);
}

fn print_codes(codes: &IssueCodes) {
    for code in codes.iter() {
        println!("{code}");
    }
}
