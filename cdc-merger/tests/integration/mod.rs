mod fs_job_test;
mod merge_semantics_test;
