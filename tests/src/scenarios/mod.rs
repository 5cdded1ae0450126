mod s1_genesis_and_block;
mod s2_fee_priority;
mod s3_size_skip;
mod s4_duplicate_import;
mod s5_stale_import;
mod s6_bounded_reorg;
