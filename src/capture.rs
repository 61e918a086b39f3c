use image::RgbImage;

use crate::error::Result;

/// One full-screen snapshot, row-major with the origin at the top-left.
pub type Frame = RgbImage;

/// Anything that can hand out a fresh snapshot of the screen.
pub trait ScreenSource {
    fn capture(&mut self) -> Result<Frame>;
}

impl<S: ScreenSource + ?Sized> ScreenSource for Box<S> {
    fn capture(&mut self) -> Result<Frame> {
        (**self).capture()
    }
}

/// Repacks top-down BGRA rows into an RGB frame in one pass. `None` when the
/// buffer doesn't hold exactly `width * height` pixels.
pub fn frame_from_bgra(width: u32, height: u32, bgra: &[u8]) -> Option<Frame> {
    let pixels = width as usize * height as usize;
    if bgra.len() != pixels * 4 {
        return None;
    }

    let mut rgb = vec![0u8; pixels * 3];
    for (dst, src) in rgb.chunks_exact_mut(3).zip(bgra.chunks_exact(4)) {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
    }
    Frame::from_raw(width, height, rgb)
}

#[cfg(windows)]
pub use self::gdi::{mark_dpi_aware, GdiScreen};

#[cfg(windows)]
mod gdi {
    use log::{info, warn};
    use windows::Win32::Foundation::HWND;
    use windows::Win32::Graphics::Gdi::{
        BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
        GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
        DIB_RGB_COLORS, RGBQUAD, SRCCOPY,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        GetSystemMetrics, SetProcessDPIAware, SM_CXSCREEN, SM_CYSCREEN,
    };

    use super::{frame_from_bgra, Frame, ScreenSource};
    use crate::error::{CollectorError, Result};

    /// Without this, capture runs in scaled pixels while the cursor moves in physical ones.
    pub fn mark_dpi_aware() {
        if unsafe { SetProcessDPIAware() }.as_bool() {
            info!("[CAPTURE] Process marked DPI aware");
        } else {
            warn!("[CAPTURE] Could not mark process DPI aware; clicks may land off target on scaled displays");
        }
    }

    /// Primary display grabbed through GDI `BitBlt`.
    #[derive(Debug, Default)]
    pub struct GdiScreen {
        // DIB scratch, reused while the resolution stays the same.
        bgra: Vec<u8>,
    }

    impl GdiScreen {
        pub fn new() -> Self {
            let (width, height) = unsafe {
                (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN))
            };
            info!("[CAPTURE] Primary screen is {}x{}", width, height);
            Self::default()
        }
    }

    impl ScreenSource for GdiScreen {
        fn capture(&mut self) -> Result<Frame> {
            // Re-read every time so a resolution change doesn't skew coordinates.
            let (width, height) = unsafe {
                (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN))
            };
            if width <= 0 || height <= 0 {
                return Err(CollectorError::Capture(format!(
                    "screen reports invalid size {}x{}",
                    width, height
                )));
            }

            self.bgra.resize(width as usize * height as usize * 4, 0);
            unsafe { grab_bgra(width, height, &mut self.bgra)? };

            frame_from_bgra(width as u32, height as u32, &self.bgra).ok_or_else(|| {
                CollectorError::Capture("pixel buffer does not match screen size".to_string())
            })
        }
    }

    /// Copies the desktop into a top-down 32-bit DIB, writing BGRA bytes into `buffer`.
    unsafe fn grab_bgra(width: i32, height: i32, buffer: &mut [u8]) -> Result<()> {
        let hwnd = HWND(0);
        let hdc_screen = GetDC(hwnd);
        if hdc_screen.is_invalid() {
            return Err(CollectorError::Capture("failed to get screen DC".to_string()));
        }

        let hdc_mem = CreateCompatibleDC(hdc_screen);
        if hdc_mem.is_invalid() {
            ReleaseDC(hwnd, hdc_screen);
            return Err(CollectorError::Capture("failed to create compatible DC".to_string()));
        }

        let hbitmap = CreateCompatibleBitmap(hdc_screen, width, height);
        if hbitmap.is_invalid() {
            DeleteDC(hdc_mem);
            ReleaseDC(hwnd, hdc_screen);
            return Err(CollectorError::Capture("failed to create bitmap".to_string()));
        }

        let old_bitmap = SelectObject(hdc_mem, hbitmap);
        let blit = BitBlt(hdc_mem, 0, 0, width, height, hdc_screen, 0, 0, SRCCOPY);

        let mut bmi = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                biHeight: -height, // negative: top-down rows
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0 as u32,
                biSizeImage: 0,
                biXPelsPerMeter: 0,
                biYPelsPerMeter: 0,
                biClrUsed: 0,
                biClrImportant: 0,
            },
            bmiColors: [RGBQUAD::default(); 1],
        };
        let lines = if blit.is_ok() {
            GetDIBits(
                hdc_mem,
                hbitmap,
                0,
                height as u32,
                Some(buffer.as_mut_ptr() as *mut std::ffi::c_void),
                &mut bmi,
                DIB_RGB_COLORS,
            )
        } else {
            0
        };

        SelectObject(hdc_mem, old_bitmap);
        DeleteObject(hbitmap);
        DeleteDC(hdc_mem);
        ReleaseDC(hwnd, hdc_screen);

        if let Err(e) = blit {
            return Err(CollectorError::Capture(format!("BitBlt failed: {}", e)));
        }
        if lines != height {
            return Err(CollectorError::Capture(format!(
                "GetDIBits copied {} of {} lines",
                lines, height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectorError;
    use image::Rgb;

    struct Scripted(Vec<Result<Frame>>);

    impl ScreenSource for Scripted {
        fn capture(&mut self) -> Result<Frame> {
            self.0.remove(0)
        }
    }

    #[test]
    fn boxed_sources_forward_to_the_inner_source() {
        let frame = Frame::from_pixel(2, 2, Rgb([9, 9, 9]));
        let mut source: Box<dyn ScreenSource> = Box::new(Scripted(vec![
            Ok(frame.clone()),
            Err(CollectorError::Capture("lost display".to_string())),
        ]));

        assert_eq!(source.capture().unwrap(), frame);
        assert!(matches!(source.capture(), Err(CollectorError::Capture(_))));
    }

    #[test]
    fn bgra_rows_become_rgb_pixels() {
        let bgra: [u8; 16] = [
            0x01, 0xF6, 0xFE, 0xFF, 10, 20, 30, 0xFF, //
            0, 0, 0, 0, 3, 2, 1, 0x80,
        ];

        let frame = frame_from_bgra(2, 2, &bgra).unwrap();

        assert_eq!(frame.get_pixel(0, 0), &Rgb([0xFE, 0xF6, 0x01]));
        assert_eq!(frame.get_pixel(1, 0), &Rgb([30, 20, 10]));
        assert_eq!(frame.get_pixel(0, 1), &Rgb([0, 0, 0]));
        assert_eq!(frame.get_pixel(1, 1), &Rgb([1, 2, 3]));
    }

    #[test]
    fn short_bgra_buffer_is_rejected() {
        assert!(frame_from_bgra(2, 2, &[0u8; 12]).is_none());
    }
}
