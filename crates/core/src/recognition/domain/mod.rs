pub mod cue_text_binder;
pub mod text_recognizer;
