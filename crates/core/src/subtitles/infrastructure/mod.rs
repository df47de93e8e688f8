pub mod srt_file_writer;
