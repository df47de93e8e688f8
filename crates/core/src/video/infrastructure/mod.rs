pub mod ffmpeg_reader;
pub mod image_file_writer;
