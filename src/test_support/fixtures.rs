//! Recipe and dependency fixtures.

use crate::core::dependency::{DependencyMap, DependencyRef};
use crate::core::recipe::Recipe;

/// The shipped xeus-python recipe.
pub const XEUS_PYTHON_RECIPE: &str = include_str!("../../recipes/xeus-python/Drydock.toml");

/// Top-level CMakeLists.txt shaped like upstream xeus-python 0.15.12, cut
/// down to the lines the recipe's patches touch.
pub const CMAKE_LISTS: &str = r##"cmake_minimum_required(VERSION 3.4.3)
project(xeus-python)

find_package(PythonInterp ${PythonLibsNew_FIND_VERSION} REQUIRED)
find_package(xeus-zmq REQUIRED)

macro(xpyt_create_target target_name linkage output_name)
    target_link_libraries(${target_name} PRIVATE ${PYTHON_LIBRARIES})
endmacro()

install(TARGETS xeus-python xeus-python-static
        EXPORT ${PROJECT_NAME}-targets
        ARCHIVE DESTINATION ${CMAKE_INSTALL_LIBDIR}
        LIBRARY DESTINATION ${CMAKE_INSTALL_LIBDIR}
        RUNTIME DESTINATION ${CMAKE_INSTALL_BINDIR}
        PUBLIC_HEADER DESTINATION ${CMAKE_INSTALL_INCLUDEDIR}/xeus-python)

install(TARGETS xpython
        RUNTIME DESTINATION ${CMAKE_INSTALL_BINDIR})
"##;

pub fn xeus_python_recipe() -> Recipe {
    Recipe::parse(XEUS_PYTHON_RECIPE).expect("fixture recipe parses")
}

/// Locations for every dependency of [`xeus_python_recipe`].
pub fn full_deps() -> DependencyMap {
    [
        "nlohmann_json",
        "xeus",
        "xtl",
        "xeus-zmq",
        "pybind11",
        "pybind11_json",
    ]
    .into_iter()
    .map(|name| DependencyRef::new(name, format!("/deps/{}", name)))
    .collect()
}
