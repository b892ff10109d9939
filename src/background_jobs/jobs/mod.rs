mod enrichment_pass;

pub use enrichment_pass::EnrichmentPassJob;
