pub mod path;

pub use path::{
    absolutize, case_fold, ensure_trailing_slash, is_absolute, normalize_separators, path_key,
    split_folder_file, stable_hash64,
};
