use sequin::*;

fn main() {
    let patterns = Patterns::expand(&["****CG****", "**CG**", "CG"], "CG", DEFAULT_MAX_WILDCARDS)
        .unwrap_or_else(|e| panic!("{e}"));
    let scanner = Scanner::new(&patterns);

    let records = read_fasta_bytes(
        b">chr_demo\nTTGACGTTAACGCGATNNCGTACGGGCGCTAACG\n>chr_demo2\nACGCGCGT\n",
        "demo",
    )
    .unwrap_or_else(|e| panic!("{e}"));

    let mut counts = scanner.new_counts();
    for record in &records {
        scanner.count_record(record, &mut counts);
    }

    for result in scanner.results(&counts, true) {
        println!("{}\t{}", result.template, result.total);
        for m in result.motifs.iter().flatten() {
            println!("  {}\t{}", m.motif, m.count);
        }
    }
}
