mod capture;

pub use capture::CameraSource;
