use crate::error::Result;

/// Screen position in pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The OS pointer: read where it is, move it, press the primary button.
pub trait Pointer {
    fn position(&mut self) -> Result<Point>;
    fn move_to(&mut self, to: Point) -> Result<()>;
    fn click(&mut self) -> Result<()>;
}

impl<P: Pointer + ?Sized> Pointer for Box<P> {
    fn position(&mut self) -> Result<Point> {
        (**self).position()
    }

    fn move_to(&mut self, to: Point) -> Result<()> {
        (**self).move_to(to)
    }

    fn click(&mut self) -> Result<()> {
        (**self).click()
    }
}

/// Jump to `target`, click once, then put the pointer back where it was.
///
/// If the starting position can't be read nothing moves. Once the pointer has
/// left its origin the restore is always attempted, and the first failure is
/// the one reported.
pub fn actuate<P: Pointer + ?Sized>(pointer: &mut P, target: Point) -> Result<()> {
    let origin = pointer.position()?;

    let clicked = pointer.move_to(target).and_then(|()| pointer.click());
    let restored = pointer.move_to(origin);

    clicked.and(restored)
}

#[cfg(windows)]
pub use self::win32::Win32Pointer;

#[cfg(windows)]
mod win32 {
    use windows::Win32::Foundation::POINT;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
        MOUSEINPUT, MOUSE_EVENT_FLAGS,
    };
    use windows::Win32::UI::WindowsAndMessaging::{GetCursorPos, SetCursorPos};

    use super::{Point, Pointer};
    use crate::error::{CollectorError, Result};

    /// Desktop cursor driven through `SetCursorPos` and `SendInput`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct Win32Pointer;

    fn button_input(flags: MOUSE_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: 0,
                    dy: 0,
                    mouseData: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    impl Pointer for Win32Pointer {
        fn position(&mut self) -> Result<Point> {
            let mut point = POINT { x: 0, y: 0 };
            unsafe { GetCursorPos(&mut point) }
                .map_err(|e| CollectorError::input("read position", e))?;
            Ok(Point::new(point.x, point.y))
        }

        fn move_to(&mut self, to: Point) -> Result<()> {
            unsafe { SetCursorPos(to.x, to.y) }.map_err(|e| CollectorError::input("move", e))
        }

        fn click(&mut self) -> Result<()> {
            let inputs = [
                button_input(MOUSEEVENTF_LEFTDOWN),
                button_input(MOUSEEVENTF_LEFTUP),
            ];
            let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
            if sent as usize != inputs.len() {
                return Err(CollectorError::input(
                    "click",
                    windows::core::Error::from_win32(),
                ));
            }
            Ok(())
        }
    }
}
