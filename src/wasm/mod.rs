pub mod d3;

use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

#[wasm_bindgen(typescript_custom_section)]
const TS_CONSTANTS_BOUNDS: &'static str = r#"
export const BOX_ID_LEFT = -1;
export const BOX_ID_RIGHT = -2;
export const BOX_ID_FRONT = -3;
export const BOX_ID_BACK = -4;
export const BOX_ID_BOTTOM = -5;
export const BOX_ID_TOP = -6;
"#;

/// Groups a flat coordinate buffer into points, `None` if its length is not a multiple of 3.
pub fn chunk_points(flat: &[f32]) -> Option<Vec<[f32; 3]>> {
    if flat.len() % 3 != 0 {
        return None;
    }
    Some(flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_points() {
        assert_eq!(chunk_points(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(), vec![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
        assert!(chunk_points(&[0.0, 1.0]).is_none());
        assert!(chunk_points(&[]).unwrap().is_empty());
    }
}
