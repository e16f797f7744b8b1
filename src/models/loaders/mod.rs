pub mod json_loader;

pub use json_loader::{
    decode_document, encode_document, load_script_file, load_suite_file, save_script_file,
    save_suite_file,
};
