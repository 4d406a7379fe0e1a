//===========================================================================//

macro_rules! invalid_data {
    ($e:expr) => {
        return Err($crate::Error::InvalidData(::std::string::String::from($e)))
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::Error::InvalidData(format!($fmt, $($arg)+)))
    };
}

macro_rules! invalid_input {
    ($e:expr) => {
        return Err($crate::Error::InvalidInput(::std::string::String::from($e)))
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::Error::InvalidInput(format!($fmt, $($arg)+)))
    };
}

//===========================================================================//
